/// Default configuration file, resolved against the working directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Directory holding VCS working copies, one per plugin.
pub const PLUGINS_DIR: &str = "plugins";

/// Root of every generated artifact.
pub const BUILD_DIR: &str = "build";

/// Subdirectory of the build tree holding plugin packages and the manifest.
pub const BUILD_PLUGINS_DIR: &str = "Plugins";

/// Subdirectory of the build tree holding the repository addon.
pub const BUILD_REPO_DIR: &str = "Repository";

/// Cumulative manifest file name.
pub const MANIFEST_FILENAME: &str = "addons.xml";

/// Manifest checksum file name.
pub const MANIFEST_CHECKSUM_FILENAME: &str = "addons.xml.md5";

/// Descriptor file name inside every addon.
pub const DESCRIPTOR_FILENAME: &str = "addon.xml";

/// Changelog file name inside every addon.
pub const CHANGELOG_FILENAME: &str = "changelog.txt";

/// Repository icon file name.
pub const ICON_FILENAME: &str = "icon.png";

/// Listing file written by the site renderer.
pub const INDEX_FILENAME: &str = "index.html";

/// Extension of checksum sidecar files.
pub const CHECKSUM_EXT: &str = "md5";

/// Read size used when hashing files.
pub const CHECKSUM_CHUNK_SIZE: usize = 4096;

/// Platform runtime the repository addon depends on.
pub const RUNTIME_ADDON: &str = "xbmc.addon";

/// Minimum platform runtime version.
pub const RUNTIME_VERSION: &str = "12.0.0";
