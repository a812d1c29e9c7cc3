//! Canonical package layout.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartridge::config::paths;
//!
//! let manifest = package_dir.join(paths::MANIFEST_FILE);
//! let settings = paths::assignment_settings_path(&href);
//! ```
//!
//! ## Layout
//!
//! | Location | Holds |
//! |----------|-------|
//! | `imsmanifest.xml` | Organization tree and resource list |
//! | `course_settings/` | Boilerplate descriptors and module metadata |
//! | `wiki_content/` | Wiki page HTML |
//! | `web_resources/` | Uploaded files |
//! | `discussions/` | Discussion topics attached to modules |
//! | `non_cc_assessments/` | QTI copies of quizzes |
//! | `<identifier>/` | Assignment and quiz artifacts |

// ============================================================================
// Fixed files
// ============================================================================

/// Package manifest at the root
pub const MANIFEST_FILE: &str = "imsmanifest.xml";

pub const CANVAS_EXPORT_FILE: &str = "course_settings/canvas_export.txt";
pub const COURSE_SETTINGS_FILE: &str = "course_settings/course_settings.xml";
pub const CONTEXT_FILE: &str = "course_settings/context.xml";
pub const ASSIGNMENT_GROUPS_FILE: &str = "course_settings/assignment_groups.xml";
pub const FILES_META_FILE: &str = "course_settings/files_meta.xml";
pub const LATE_POLICY_FILE: &str = "course_settings/late_policy.xml";
pub const MEDIA_TRACKS_FILE: &str = "course_settings/media_tracks.xml";
pub const MODULE_META_FILE: &str = "course_settings/module_meta.xml";

/// Files listed under the course-settings manifest resource
pub const COURSE_SETTINGS_RESOURCE_FILES: [&str; 8] = [
    CANVAS_EXPORT_FILE,
    COURSE_SETTINGS_FILE,
    CONTEXT_FILE,
    ASSIGNMENT_GROUPS_FILE,
    FILES_META_FILE,
    LATE_POLICY_FILE,
    MEDIA_TRACKS_FILE,
    MODULE_META_FILE,
];

// ============================================================================
// Directories
// ============================================================================

pub const COURSE_SETTINGS_DIR: &str = "course_settings";
pub const WIKI_CONTENT_DIR: &str = "wiki_content";
pub const NON_CC_ASSESSMENTS_DIR: &str = "non_cc_assessments";
pub const WEB_RESOURCES_DIR: &str = "web_resources";
pub const ASSIGNMENTS_DIR: &str = "assignments";
pub const DISCUSSIONS_DIR: &str = "discussions";
pub const QUIZZES_DIR: &str = "quizzes";
pub const FILES_DIR: &str = "files";
pub const MEDIA_DIR: &str = "media";
pub const EXTERNAL_TOOLS_DIR: &str = "external_tools";

/// Directories created for every new package
pub const PACKAGE_DIRS: [&str; 10] = [
    COURSE_SETTINGS_DIR,
    WIKI_CONTENT_DIR,
    NON_CC_ASSESSMENTS_DIR,
    WEB_RESOURCES_DIR,
    ASSIGNMENTS_DIR,
    DISCUSSIONS_DIR,
    QUIZZES_DIR,
    FILES_DIR,
    MEDIA_DIR,
    EXTERNAL_TOOLS_DIR,
];

// ============================================================================
// Per-record artifacts
// ============================================================================

pub const ASSIGNMENT_SETTINGS_NAME: &str = "assignment_settings.xml";
pub const ASSESSMENT_META_NAME: &str = "assessment_meta.xml";
pub const ASSESSMENT_QTI_NAME: &str = "assessment_qti.xml";

/// Default HTML body location for a new assignment
pub fn assignment_href(id: &str) -> String {
    format!("{}/assignment.html", id)
}

/// Settings document beside an assignment body
pub fn assignment_settings_path(href: &str) -> String {
    match href.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, ASSIGNMENT_SETTINGS_NAME),
        None => ASSIGNMENT_SETTINGS_NAME.to_string(),
    }
}

pub fn assessment_meta_path(quiz_id: &str) -> String {
    format!("{}/{}", quiz_id, ASSESSMENT_META_NAME)
}

pub fn assessment_qti_path(quiz_id: &str) -> String {
    format!("{}/{}", quiz_id, ASSESSMENT_QTI_NAME)
}

pub fn non_cc_qti_path(quiz_id: &str) -> String {
    format!("{}/{}.xml.qti", NON_CC_ASSESSMENTS_DIR, quiz_id)
}

/// Discussion topic or meta document; module discussions live under
/// `discussions/`, standalone ones at the package root
pub fn discussion_path(id: &str, in_module: bool) -> String {
    if in_module {
        format!("{}/{}.xml", DISCUSSIONS_DIR, id)
    } else {
        format!("{}.xml", id)
    }
}

/// Top-level directory of a package-relative path
pub fn top_dir(relative: &str) -> Option<&str> {
    relative.split_once('/').map(|(dir, _)| dir)
}

/// Why `name` cannot be used as one path segment inside the package, if it
/// cannot
pub fn segment_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("is empty")
    } else if name.contains(|c: char| c == '/' || c == '\\') {
        Some("contains a path separator")
    } else if name == "." || name == ".." {
        Some("is a relative path segment")
    } else if name.contains('\0') {
        Some("contains a NUL byte")
    } else {
        None
    }
}

/// True when a package-relative path cannot resolve outside the package root
pub fn is_contained(relative: &str) -> bool {
    relative.split('/').all(|segment| segment_problem(segment).is_none())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_settings_files_live_in_course_settings() {
        for file in COURSE_SETTINGS_RESOURCE_FILES {
            assert_eq!(top_dir(file), Some(COURSE_SETTINGS_DIR));
        }
    }

    #[test]
    fn test_assignment_paths() {
        assert_eq!(assignment_href("g1"), "g1/assignment.html");
        assert_eq!(
            assignment_settings_path("g1/assignment.html"),
            "g1/assignment_settings.xml"
        );
        assert_eq!(
            assignment_settings_path("g1/week-one.html"),
            "g1/assignment_settings.xml"
        );
    }

    #[test]
    fn test_quiz_paths() {
        assert_eq!(assessment_meta_path("gq"), "gq/assessment_meta.xml");
        assert_eq!(assessment_qti_path("gq"), "gq/assessment_qti.xml");
        assert_eq!(non_cc_qti_path("gq"), "non_cc_assessments/gq.xml.qti");
    }

    #[test]
    fn test_discussion_location_depends_on_attachment() {
        assert_eq!(discussion_path("gt", true), "discussions/gt.xml");
        assert_eq!(discussion_path("gt", false), "gt.xml");
    }

    #[test]
    fn test_top_dir() {
        assert_eq!(top_dir("wiki_content/a.html"), Some("wiki_content"));
        assert_eq!(top_dir("imsmanifest.xml"), None);
    }

    #[test]
    fn test_segment_problem() {
        assert_eq!(segment_problem("notes.txt"), None);
        assert_eq!(segment_problem("notes (Copy).txt"), None);
        assert_eq!(segment_problem(""), Some("is empty"));
        assert_eq!(segment_problem("   "), Some("is empty"));
        assert_eq!(segment_problem("../x.txt"), Some("contains a path separator"));
        assert_eq!(segment_problem("a\\b.txt"), Some("contains a path separator"));
        assert_eq!(segment_problem(".."), Some("is a relative path segment"));
        assert_eq!(segment_problem("."), Some("is a relative path segment"));
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained("web_resources/notes.txt"));
        assert!(is_contained("web_resources/images/a.png"));
        assert!(!is_contained("web_resources/../../escaped.txt"));
        assert!(!is_contained("/etc/passwd"));
        assert!(!is_contained("web_resources/"));
        assert!(!is_contained(""));
    }
}
