pub const BUNDLE_PREFIX: &str = "nightly/lattice-bundle";
pub const LATEST_PREFIX: &str = "nightly/lattice-bundle-latest-";

const FILENAME_MARKER: &str = "lattice-bundle-";
const EXTENSION: &str = ".zip";

/// Whether `key` is a nightly bundle archive that belongs in the listing.
pub fn is_nightly_bundle(key: &str) -> bool {
    key.starts_with(BUNDLE_PREFIX) && !key.starts_with(LATEST_PREFIX)
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a bundle file name of the form lattice-bundle-<version>-<arch>.zip")]
pub struct BundleKeyError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleKey {
    pub version: String,
    pub arch: String,
}

impl BundleKey {
    /// Splits `…lattice-bundle-<version>-<arch>.zip` into version and arch. The
    /// arch is everything after the last `-`, so versions may contain dashes.
    pub fn parse(key: &str) -> Result<BundleKey, BundleKeyError> {
        Self::parse_parts(key).ok_or_else(|| BundleKeyError(key.to_owned()))
    }

    fn parse_parts(key: &str) -> Option<BundleKey> {
        let (rest, arch) = key.strip_suffix(EXTENSION)?.rsplit_once('-')?;
        let (_, version) = rest.split_once(FILENAME_MARKER)?;
        if version.is_empty() || arch.is_empty() {
            return None;
        }
        Some(BundleKey {
            version: version.to_owned(),
            arch: arch.to_owned(),
        })
    }
}
