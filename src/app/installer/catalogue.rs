use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

const EMBEDDED: &str = include_str!("../../../assets/packages.json");

/// Which pinned toolchain to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Channel {
    #[default]
    Recent,
    Compatible,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Recent, Channel::Compatible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Recent => "Recent",
            Channel::Compatible => "Compatible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// pacman package name
    pub pkg: String,
    pub version: String,
    /// Archive file name inside the temporary directory
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot {
    Gcc,
    GccLibs,
    Cuda,
    Cudnn,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Gcc, Slot::GccLibs, Slot::Cuda, Slot::Cudnn];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub support: Vec<String>,
    pub gcc: Package,
    #[serde(rename = "gcc-libs", alias = "gcc_libs")]
    pub gcc_libs: Package,
    pub cuda: Package,
    pub cudnn: Package,
}

impl Release {
    pub fn package(&self, slot: Slot) -> &Package {
        match slot {
            Slot::Gcc => &self.gcc,
            Slot::GccLibs => &self.gcc_libs,
            Slot::Cuda => &self.cuda,
            Slot::Cudnn => &self.cudnn,
        }
    }

    /// Packages in install priority order.
    pub fn packages(&self) -> impl Iterator<Item = (Slot, &Package)> {
        Slot::ALL.into_iter().map(move |slot| (slot, self.package(slot)))
    }

    /// The `IgnorePkg` line that pins this release in pacman.conf.
    pub fn ignore_pkg_line(&self) -> String {
        let names: Vec<&str> = self.packages().map(|(_, p)| p.pkg.as_str()).collect();
        format!("IgnorePkg = {}", names.join(" "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogue {
    pub deps: String,
    pub recent: Release,
    pub compatible: Release,
}

impl Catalogue {
    /// The catalogue compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let catalogue: Catalogue = serde_json::from_str(content)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn release(&self, channel: Channel) -> &Release {
        match channel {
            Channel::Recent => &self.recent,
            Channel::Compatible => &self.compatible,
        }
    }

    pub fn dependencies(&self) -> Vec<&str> {
        self.deps.split_whitespace().collect()
    }
}

impl Validate for Catalogue {
    fn validate(&self) -> Result<()> {
        for (label, release) in [("recent", &self.recent), ("compatible", &self.compatible)] {
            for (slot, package) in release.packages() {
                let field = format!("{}.{:?}", label, slot);
                validation::validate_non_blank(&field, &package.pkg)?;
                validation::validate_non_blank(&field, &package.version)?;
                validation::validate_download_link(&field, &package.link)?;
                validation::validate_file_name(&field, &package.name)?;
            }
        }
        Ok(())
    }
}
