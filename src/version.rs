//! Build metadata stamped in by `build.rs`.

use std::fmt;

/// What was built, from where, and with which toolchain.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    /// "true", "false" or "unknown" when git was unavailable
    dirty: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub host: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

const BUILD: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GPT_STUDIO_GIT_HASH"),
    git_branch: env!("GPT_STUDIO_GIT_BRANCH"),
    dirty: env!("GPT_STUDIO_GIT_DIRTY"),
    built_at: env!("GPT_STUDIO_BUILD_TIMESTAMP"),
    target: env!("GPT_STUDIO_TARGET"),
    host: env!("GPT_STUDIO_HOST"),
    profile: env!("GPT_STUDIO_PROFILE"),
    rustc: env!("GPT_STUDIO_RUSTC_VERSION"),
};

impl BuildInfo {
    pub fn git_dirty(&self) -> bool {
        self.dirty == "true"
    }

    /// `0.1.0-abc12345`, with `-dirty` appended for uncommitted builds
    pub fn full_version(&self) -> String {
        let suffix = if self.git_dirty() { "-dirty" } else { "" };
        format!("{}-{}{}", self.version, self.git_hash, suffix)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = if self.git_dirty() {
            format!("{} (dirty)", self.git_hash)
        } else {
            self.git_hash.to_string()
        };

        let sections: [(&str, Vec<(&str, String)>); 3] = [
            (
                "Build Information",
                vec![
                    ("Version", self.version.to_string()),
                    ("Git Hash", hash),
                    ("Git Branch", self.git_branch.to_string()),
                    ("Built", self.built_at.to_string()),
                    ("Profile", self.profile.to_string()),
                ],
            ),
            (
                "Target",
                vec![
                    ("Triple", self.target.to_string()),
                    ("Host", self.host.to_string()),
                ],
            ),
            ("Compiler", vec![("Rustc", self.rustc.to_string())]),
        ];

        writeln!(f, "{} {}", self.name, self.full_version())?;
        for (title, rows) in &sections {
            writeln!(f, "\n{}:", title)?;
            for (label, value) in rows {
                writeln!(f, "  {:<11} {}", format!("{}:", label), value)?;
            }
        }
        Ok(())
    }
}

pub fn build_info() -> BuildInfo {
    BUILD
}

/// Print version information to stdout
pub fn print_version() {
    print!("{}", build_info());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_exists() {
        let info = build_info();
        assert_eq!(info.name, "gpt-studio");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_full_version_format() {
        let info = build_info();
        let full = info.full_version();
        assert!(full.starts_with(info.version));
        assert!(full.contains(info.git_hash));
        assert_eq!(full.ends_with("-dirty"), info.git_dirty());
    }

    #[test]
    fn test_display_format() {
        let display = build_info().to_string();
        assert!(display.starts_with("gpt-studio "));
        assert!(display.contains("Build Information:"));
        assert!(display.contains("  Git Hash:"));
        assert!(display.contains("Target:"));
        assert!(display.contains("Compiler:"));
    }
}
