//! Fixed names and numbers of the `project.pbxproj` format.

/// File name of the project description inside an `.xcodeproj` bundle.
pub const PROJECT_FILE_NAME: &str = "project.pbxproj";

/// First line of every project description.
pub const FILE_ENCODING_MARKER: &str = "// !$*UTF8*$!";

pub const ARCHIVE_VERSION: i64 = 1;
pub const OBJECT_VERSION: i64 = 42;

pub const COMPATIBILITY_VERSION: &str = "Xcode 3.2";
pub const DEFAULT_DEVELOPMENT_REGION: &str = "en";
pub const DEFAULT_CONFIGURATIONS: [&str; 2] = ["Debug", "Release"];

/// Action mask written on every build phase.
pub const BUILD_ACTION_MASK: i64 = 0x7FFF_FFFF;

/// Separator between segments of a group name path (`"Classes:Views"`).
pub const GROUP_PATH_SEPARATOR: char = ':';

/// Set to `1`, `true` or `yes` to generate reproducible identities.
pub const DETERMINISTIC_IDS_ENV: &str = "PBXGEN_DETERMINISTIC_IDS";

/// Key holding an entity's class tag.
pub const ISA_KEY: &str = "isa";

/// Key holding a record's inline annotation; never written as a field.
pub const COMMENT_KEY: &str = "comment";

pub const NAME_KEY: &str = "name";

/// Class tags.
pub mod isa {
  pub const PROJECT: &str = "PBXProject";
  pub const GROUP: &str = "PBXGroup";
  pub const VARIANT_GROUP: &str = "PBXVariantGroup";
  pub const FILE_REFERENCE: &str = "PBXFileReference";
  pub const REFERENCE_PROXY: &str = "PBXReferenceProxy";
  pub const BUILD_FILE: &str = "PBXBuildFile";
  pub const NATIVE_TARGET: &str = "PBXNativeTarget";
  pub const AGGREGATE_TARGET: &str = "PBXAggregateTarget";
  pub const CONTAINER_ITEM_PROXY: &str = "PBXContainerItemProxy";
  pub const TARGET_DEPENDENCY: &str = "PBXTargetDependency";
  pub const BUILD_CONFIGURATION: &str = "XCBuildConfiguration";
  pub const CONFIGURATION_LIST: &str = "XCConfigurationList";
  pub const SOURCES_PHASE: &str = "PBXSourcesBuildPhase";
  pub const RESOURCES_PHASE: &str = "PBXResourcesBuildPhase";
  pub const FRAMEWORKS_PHASE: &str = "PBXFrameworksBuildPhase";
  pub const HEADERS_PHASE: &str = "PBXHeadersBuildPhase";
  pub const SHELL_SCRIPT_PHASE: &str = "PBXShellScriptBuildPhase";
  pub const COPY_FILES_PHASE: &str = "PBXCopyFilesBuildPhase";
}

/// `sourceTree` values.
pub mod source_tree {
  pub const GROUP: &str = "<group>";
  pub const ABSOLUTE: &str = "<absolute>";
  pub const BUILT_PRODUCTS: &str = "BUILT_PRODUCTS_DIR";
  pub const SDK: &str = "SDKROOT";
  /// Directory containing the generated `.xcodeproj`.
  pub const SOURCE_ROOT: &str = "SOURCE_ROOT";
}

/// Build setting names written by the generator.
pub mod settings {
  pub const PROJECT_ROOT: &str = "PROJECT_ROOT";
  pub const PRODUCT_NAME: &str = "PRODUCT_NAME";
  pub const COPY_PHASE_STRIP: &str = "COPY_PHASE_STRIP";
  pub const COMPILER_FLAGS: &str = "COMPILER_FLAGS";
}
