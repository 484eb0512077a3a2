//! Platform keys and their install command prefixes.
//!
//! Every platform a catalog entry can map to is a `Platform` variant whose
//! string form is the exact key used in `packages-info.json`. All per-platform
//! facts (command prefix, auxiliary fallback, OS family, whether the key may be
//! chosen as a target) live in the single `PLATFORMS` table below.
//!
//! # Platform Table
//!
//! | Key                   | Command prefix          | Fallback         |
//! |-----------------------|-------------------------|------------------|
//! | `linux_arch_pacman`   | `sudo pacman -S`        | `linux_arch_aur` |
//! | `linux_arch_aur`      | `yay -S`                | (fallback only)  |
//! | `linux_debian_apt`    | `sudo apt install`      |                  |
//! | `linux_fedora_rpm`    | `sudo dnf install`      |                  |
//! | `linux_gentoo_emerge` | `sudo emerge`           |                  |
//! | `unix_nix_env`        | `sudo nix-env -iA`      |                  |
//! | `linux_void_xbps`     | `sudo xbps-install -S`  |                  |
//! | `linux_flatpak`       | `flatpak install`       |                  |
//! | `linux_snap`          | `sudo snap install`     |                  |
//! | `freebsd_pkg`         | `sudo pkg install`      |                  |
//! | `macos_brew`          | `brew install`          |                  |
//! | `windows_winget`      | `winget install`        |                  |

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, info};

/// A package manager target, identified by its catalog key.
///
/// Variant order matches the row order of `PLATFORMS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[strum(serialize = "linux_arch_pacman")]
    LinuxArchPacman,
    #[strum(serialize = "linux_arch_aur")]
    LinuxArchAur,
    #[strum(serialize = "linux_debian_apt")]
    LinuxDebianApt,
    #[strum(serialize = "linux_fedora_rpm")]
    LinuxFedoraRpm,
    #[strum(serialize = "linux_gentoo_emerge")]
    LinuxGentooEmerge,
    #[strum(serialize = "unix_nix_env")]
    UnixNixEnv,
    #[strum(serialize = "linux_void_xbps")]
    LinuxVoidXbps,
    #[strum(serialize = "linux_flatpak")]
    LinuxFlatpak,
    #[strum(serialize = "linux_snap")]
    LinuxSnap,
    #[strum(serialize = "freebsd_pkg")]
    FreebsdPkg,
    #[strum(serialize = "macos_brew")]
    MacosBrew,
    #[strum(serialize = "windows_winget")]
    WindowsWinget,
}

/// Operating system family, the first tier of platform selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Windows,
    Macos,
    Bsd,
}

/// Static facts about one platform key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSpec {
    pub platform: Platform,
    /// Human-readable label for listings
    pub label: &'static str,
    /// Command the package identifiers are appended to
    pub command_prefix: &'static str,
    /// Auxiliary repository consulted when the primary key is absent
    pub fallback: Option<Platform>,
    pub os_family: OsFamily,
    /// False for keys that only exist as a fallback source
    pub selectable: bool,
}

/// The platform table. Row `i` describes the variant with discriminant `i`.
pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        platform: Platform::LinuxArchPacman,
        label: "Arch Linux (pacman)",
        command_prefix: "sudo pacman -S",
        fallback: Some(Platform::LinuxArchAur),
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::LinuxArchAur,
        label: "Arch User Repository (yay)",
        command_prefix: "yay -S",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: false,
    },
    PlatformSpec {
        platform: Platform::LinuxDebianApt,
        label: "Debian / Ubuntu (apt)",
        command_prefix: "sudo apt install",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::LinuxFedoraRpm,
        label: "Fedora (dnf)",
        command_prefix: "sudo dnf install",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::LinuxGentooEmerge,
        label: "Gentoo (emerge)",
        command_prefix: "sudo emerge",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::UnixNixEnv,
        label: "Nix (nix-env)",
        command_prefix: "sudo nix-env -iA",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::LinuxVoidXbps,
        label: "Void Linux (xbps)",
        command_prefix: "sudo xbps-install -S",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::LinuxFlatpak,
        label: "Flatpak",
        command_prefix: "flatpak install",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::LinuxSnap,
        label: "Snap",
        command_prefix: "sudo snap install",
        fallback: None,
        os_family: OsFamily::Linux,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::FreebsdPkg,
        label: "FreeBSD (pkg)",
        command_prefix: "sudo pkg install",
        fallback: None,
        os_family: OsFamily::Bsd,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::MacosBrew,
        label: "macOS (Homebrew)",
        command_prefix: "brew install",
        fallback: None,
        os_family: OsFamily::Macos,
        selectable: true,
    },
    PlatformSpec {
        platform: Platform::WindowsWinget,
        label: "Windows (winget)",
        command_prefix: "winget install",
        fallback: None,
        os_family: OsFamily::Windows,
        selectable: true,
    },
];

impl Platform {
    /// Table row for this platform.
    pub fn spec(self) -> &'static PlatformSpec {
        &PLATFORMS[self as usize]
    }

    /// Catalog key, e.g. `macos_brew`.
    pub fn key(self) -> &'static str {
        match self {
            Self::LinuxArchPacman => "linux_arch_pacman",
            Self::LinuxArchAur => "linux_arch_aur",
            Self::LinuxDebianApt => "linux_debian_apt",
            Self::LinuxFedoraRpm => "linux_fedora_rpm",
            Self::LinuxGentooEmerge => "linux_gentoo_emerge",
            Self::UnixNixEnv => "unix_nix_env",
            Self::LinuxVoidXbps => "linux_void_xbps",
            Self::LinuxFlatpak => "linux_flatpak",
            Self::LinuxSnap => "linux_snap",
            Self::FreebsdPkg => "freebsd_pkg",
            Self::MacosBrew => "macos_brew",
            Self::WindowsWinget => "windows_winget",
        }
    }

    pub fn command_prefix(self) -> &'static str {
        self.spec().command_prefix
    }

    pub fn fallback(self) -> Option<Platform> {
        self.spec().fallback
    }

    pub fn os_family(self) -> OsFamily {
        self.spec().os_family
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Whether this key may be chosen as an install target.
    pub fn is_selectable(self) -> bool {
        self.spec().selectable
    }

    /// All platforms that may be chosen as an install target, in table order.
    pub fn selectable() -> impl Iterator<Item = Platform> {
        Self::iter().filter(|p| p.is_selectable())
    }
}

impl OsFamily {
    /// Platform picked when only the OS family is known.
    pub fn default_platform(self) -> Platform {
        match self {
            Self::Linux => Platform::LinuxArchPacman,
            Self::Windows => Platform::WindowsWinget,
            Self::Macos => Platform::MacosBrew,
            Self::Bsd => Platform::FreebsdPkg,
        }
    }

    /// Selectable platforms belonging to this family, in table order.
    pub fn platforms(self) -> Vec<Platform> {
        Platform::selectable()
            .filter(|p| p.os_family() == self)
            .collect()
    }

    /// Map a `std::env::consts::OS` value to a family.
    pub fn from_os_name(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            "macos" => Some(Self::Macos),
            "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Some(Self::Bsd),
            _ => None,
        }
    }

    /// Family of the running host.
    pub fn host() -> Option<Self> {
        Self::from_os_name(std::env::consts::OS)
    }
}

/// Linux package manager binaries probed on `PATH`, in priority order.
const LINUX_PROBES: &[(&str, Platform)] = &[
    ("apt", Platform::LinuxDebianApt),
    ("dnf", Platform::LinuxFedoraRpm),
    ("pacman", Platform::LinuxArchPacman),
    ("emerge", Platform::LinuxGentooEmerge),
    ("xbps-install", Platform::LinuxVoidXbps),
    ("nix-env", Platform::UnixNixEnv),
];

/// Detect the platform of the running host.
///
/// Non-Linux hosts map straight to their family default. On Linux the first
/// package manager found on `PATH` wins; when none is found the Linux default
/// is returned. `None` means the host OS is not one we generate commands for.
pub fn detect_platform() -> Option<Platform> {
    let family = OsFamily::host()?;
    let platform = match family {
        OsFamily::Linux => detect_linux_platform(|bin| which::which(bin).is_ok()),
        other => other.default_platform(),
    };
    info!("Detected platform: {} ({})", platform, family);
    Some(platform)
}

/// Pick a Linux platform given a predicate that reports whether a binary exists.
pub fn detect_linux_platform(has_binary: impl Fn(&str) -> bool) -> Platform {
    for (binary, platform) in LINUX_PROBES {
        if has_binary(binary) {
            debug!("Found {} on PATH", binary);
            return *platform;
        }
    }
    debug!("No known package manager on PATH, using Linux default");
    OsFamily::Linux.default_platform()
}
