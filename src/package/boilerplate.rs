//! Static course-settings descriptors written once when a package is created.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::paths;
use crate::core::error::Result;
use crate::domain::{CourseInfo, Identifier};

use super::serializer::write_file;
use super::templates::{self, CANVAS_NS, XML_DECL};
use super::xml::escape;

const CANVAS_EXPORT_TEXT: &str =
    "Q: What did the panda say when he was forced out of his natural habitat?\nA: This is un-BEAR-able\n";

/// Numeric course id for `context.xml`, stable for a given course identifier
fn numeric_course_id(course: &CourseInfo) -> u64 {
    let digest = Sha256::digest(course.id.as_str().as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % 100_000_000
}

fn context(course: &CourseInfo) -> String {
    format!(
        r#"{decl}
<context_info {ns}>
  <course_id>{id}</course_id>
  <course_name>{title}</course_name>
  <root_account_id>70000000000010</root_account_id>
  <root_account_name>Free for Teacher</root_account_name>
  <root_account_uuid>{uuid}</root_account_uuid>
  <canvas_domain>canvas.instructure.com</canvas_domain>
</context_info>
"#,
        decl = XML_DECL,
        ns = CANVAS_NS,
        id = numeric_course_id(course),
        title = escape(&course.title),
        uuid = escape(&course.root_account_uuid),
    )
}

fn assignment_groups(course: &CourseInfo) -> String {
    format!(
        r#"{}
<assignmentGroups {}>
  <assignmentGroup identifier="{}">
    <title>Assignments</title>
    <position>1</position>
    <group_weight>0.0</group_weight>
  </assignmentGroup>
</assignmentGroups>
"#,
        XML_DECL,
        CANVAS_NS,
        escape(course.grading_group_id.as_str())
    )
}

fn late_policy() -> String {
    format!(
        r#"{}
<late_policy identifier="{}" {}>
  <missing_submission_deduction_enabled>false</missing_submission_deduction_enabled>
  <missing_submission_deduction>100.0</missing_submission_deduction>
  <late_submission_deduction_enabled>false</late_submission_deduction_enabled>
  <late_submission_deduction>0.0</late_submission_deduction>
  <late_submission_interval>day</late_submission_interval>
  <late_submission_minimum_percent_enabled>false</late_submission_minimum_percent_enabled>
  <late_submission_minimum_percent>0.0</late_submission_minimum_percent>
</late_policy>
"#,
        XML_DECL,
        Identifier::generate(),
        CANVAS_NS
    )
}

fn empty_root(name: &str) -> String {
    format!("{}\n<{} {}>\n</{}>\n", XML_DECL, name, CANVAS_NS, name)
}

/// Write every course-settings descriptor under `root`
pub fn write_boilerplate(root: &Path, course: &CourseInfo) -> Result<()> {
    let documents = [
        (paths::CANVAS_EXPORT_FILE, CANVAS_EXPORT_TEXT.to_string()),
        (paths::COURSE_SETTINGS_FILE, templates::course_settings(course)),
        (paths::CONTEXT_FILE, context(course)),
        (paths::ASSIGNMENT_GROUPS_FILE, assignment_groups(course)),
        (paths::FILES_META_FILE, empty_root("fileMeta")),
        (paths::LATE_POLICY_FILE, late_policy()),
        (paths::MEDIA_TRACKS_FILE, empty_root("media_tracks")),
        (paths::MODULE_META_FILE, templates::module_meta(&[])),
    ];

    for (relative, content) in documents {
        write_file(root, relative, content.as_bytes())?;
    }

    debug!(course = %course.id, "Wrote course boilerplate");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::xml::Element;
    use tempfile::TempDir;

    #[test]
    fn test_boilerplate_files_exist_and_parse() {
        let temp = TempDir::new().unwrap();
        let course = CourseInfo::new("Rust & Friends", "RF-1");

        write_boilerplate(temp.path(), &course).unwrap();

        for relative in paths::COURSE_SETTINGS_RESOURCE_FILES {
            let path = temp.path().join(relative);
            assert!(path.exists(), "missing {}", relative);
            if relative.ends_with(".xml") {
                let text = std::fs::read_to_string(&path).unwrap();
                Element::parse(&text, relative).unwrap();
            }
        }

        let settings =
            std::fs::read_to_string(temp.path().join(paths::COURSE_SETTINGS_FILE)).unwrap();
        let root = Element::parse(&settings, "course_settings.xml").unwrap();
        assert_eq!(root.attr("identifier"), Some(course.id.as_str()));
        assert_eq!(root.child_text("title"), Some("Rust & Friends"));
    }

    #[test]
    fn test_numeric_course_id_is_stable() {
        let course = CourseInfo::new("A", "B");
        assert_eq!(numeric_course_id(&course), numeric_course_id(&course));
        assert!(numeric_course_id(&course) < 100_000_000);
    }
}
