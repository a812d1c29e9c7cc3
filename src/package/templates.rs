//! Document templates for the on-disk package.
//!
//! Each function renders one artifact from graph data. All interpolated text
//! goes through [`escape`]; wiki and assignment bodies are HTML and are
//! written as-is inside `<body>`.

use crate::config::paths;
use crate::domain::payload::format_points;
use crate::domain::{
    Assignment, ContentGraph, CourseInfo, Discussion, Module, OrganizationNode, Quiz, Resource,
    ResourceType, WikiPage,
};

use super::xml::escape;

pub const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Namespace attributes shared by every course-settings style document
pub const CANVAS_NS: &str = r#"xmlns="http://canvas.instructure.com/xsd/cccv1p0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://canvas.instructure.com/xsd/cccv1p0 https://canvas.instructure.com/xsd/cccv1p0.xsd""#;

const MANIFEST_NS: &str = r#"xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1" xmlns:lom="http://ltsc.ieee.org/xsd/imsccv1p1/LOM/resource" xmlns:lomimscc="http://ltsc.ieee.org/xsd/imsccv1p1/LOM/manifest" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1 http://www.imsglobal.org/profile/cc/ccv1p1/ccv1p1_imscp_v1p2_v1p0.xsd http://ltsc.ieee.org/xsd/imsccv1p1/LOM/resource http://www.imsglobal.org/profile/cc/ccv1p1/LOM/ccv1p1_lomresource_v1p0.xsd http://ltsc.ieee.org/xsd/imsccv1p1/LOM/manifest http://www.imsglobal.org/profile/cc/ccv1p1/LOM/ccv1p1_lommanifest_v1p0.xsd""#;

const QTI_NS: &str = r#"xmlns="http://www.imsglobal.org/xsd/ims_qtiasiv1p2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.imsglobal.org/xsd/ims_qtiasiv1p2 http://www.imsglobal.org/xsd/ims_qtiasiv1p2p1.xsd""#;

const TOPIC_NS: &str = r#"xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imsdt_v1p1" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.imsglobal.org/xsd/imsccv1p1/imsdt_v1p1  http://www.imsglobal.org/profile/cc/ccv1p1/ccv1p1_imsdt_v1p1.xsd""#;

/// Root item of the organization tree that holds the modules
pub const LEARNING_MODULES: &str = "LearningModules";

/// Boolean settings shared by assignments and the assignment half of quizzes
const GRADING_FLAGS: &str = "\
<turnitin_enabled>false</turnitin_enabled>
<vericite_enabled>false</vericite_enabled>
<peer_review_count>0</peer_review_count>
<peer_reviews>false</peer_reviews>
<automatic_peer_reviews>false</automatic_peer_reviews>
<anonymous_peer_reviews>false</anonymous_peer_reviews>
<grade_group_students_individually>false</grade_group_students_individually>
<freeze_on_copy>false</freeze_on_copy>
<omit_from_final_grade>false</omit_from_final_grade>
<hide_in_gradebook>false</hide_in_gradebook>
<intra_group_peer_reviews>false</intra_group_peer_reviews>
<only_visible_to_overrides>false</only_visible_to_overrides>
<post_to_sis>false</post_to_sis>
<moderated_grading>false</moderated_grading>
<grader_count>0</grader_count>
<grader_comments_visible_to_graders>true</grader_comments_visible_to_graders>
<anonymous_grading>false</anonymous_grading>
<graders_anonymous_to_graders>false</graders_anonymous_to_graders>
<grader_names_visible_to_final_grader>true</grader_names_visible_to_final_grader>
<anonymous_instructor_annotations>false</anonymous_instructor_annotations>
<post_policy>
  <post_manually>false</post_manually>
</post_policy>";

fn indented(block: &str, indent: &str) -> String {
    block
        .lines()
        .map(|line| format!("{}{}\n", indent, line))
        .collect()
}

// ============================================================================
// Manifest
// ============================================================================

/// Files listed under a typed resource in the manifest
pub fn resource_files(resource: &Resource) -> Vec<String> {
    let mut files = vec![resource.href.clone()];

    if resource.kind == ResourceType::LearningApplication {
        if resource.href.ends_with(".html") {
            files.push(paths::assignment_settings_path(&resource.href));
        } else if resource.href.ends_with(paths::ASSESSMENT_META_NAME) {
            if let Some(quiz_id) = paths::top_dir(&resource.href) {
                files.push(paths::non_cc_qti_path(quiz_id));
            }
        }
    }

    files
}

fn render_resource(out: &mut String, resource: &Resource, files: &[String]) {
    out.push_str(&format!(
        "    <resource identifier=\"{}\" type=\"{}\" href=\"{}\">\n",
        escape(resource.id.as_str()),
        escape(resource.kind.as_str()),
        escape(&resource.href)
    ));
    for file in files {
        out.push_str(&format!("      <file href=\"{}\"/>\n", escape(file)));
    }
    if let Some(dependency) = &resource.dependency {
        out.push_str(&format!(
            "      <dependency identifierref=\"{}\"/>\n",
            escape(dependency.as_str())
        ));
    }
    out.push_str("    </resource>\n");
}

fn render_org_node(out: &mut String, node: &OrganizationNode, depth: usize) {
    let pad = "  ".repeat(depth);
    match &node.resource_ref {
        Some(target) => out.push_str(&format!(
            "{}<item identifier=\"{}\" identifierref=\"{}\">\n",
            pad,
            escape(node.id.as_str()),
            escape(target.as_str())
        )),
        None => out.push_str(&format!(
            "{}<item identifier=\"{}\">\n",
            pad,
            escape(node.id.as_str())
        )),
    }
    out.push_str(&format!("{}  <title>{}</title>\n", pad, escape(&node.title)));
    for child in &node.children {
        render_org_node(out, child, depth + 1);
    }
    out.push_str(&format!("{}</item>\n", pad));
}

/// `imsmanifest.xml`; `date` goes into the lifecycle metadata
pub fn manifest(graph: &ContentGraph, date: &str) -> String {
    let course = &graph.course;
    let mut out = format!(
        r#"{decl}
<manifest identifier="{id}" {ns}>
  <metadata>
    <schema>IMS Common Cartridge</schema>
    <schemaversion>1.1.0</schemaversion>
    <lomimscc:lom>
      <lomimscc:general>
        <lomimscc:title>
          <lomimscc:string>{title}</lomimscc:string>
        </lomimscc:title>
      </lomimscc:general>
      <lomimscc:lifeCycle>
        <lomimscc:contribute>
          <lomimscc:date>
            <lomimscc:dateTime>{date}</lomimscc:dateTime>
          </lomimscc:date>
        </lomimscc:contribute>
      </lomimscc:lifeCycle>
      <lomimscc:rights>
        <lomimscc:copyrightAndOtherRestrictions>
          <lomimscc:value>yes</lomimscc:value>
        </lomimscc:copyrightAndOtherRestrictions>
        <lomimscc:description>
          <lomimscc:string>Private (Copyrighted) - http://en.wikipedia.org/wiki/Copyright</lomimscc:string>
        </lomimscc:description>
      </lomimscc:rights>
    </lomimscc:lom>
  </metadata>
  <organizations>
    <organization identifier="org_1" structure="rooted-hierarchy">
      <item identifier="{root}">
"#,
        decl = XML_DECL,
        id = escape(course.manifest_id.as_str()),
        ns = MANIFEST_NS,
        title = escape(&course.title),
        date = escape(date),
        root = LEARNING_MODULES,
    );

    for node in &graph.organization {
        render_org_node(&mut out, node, 4);
    }

    out.push_str("      </item>\n    </organization>\n  </organizations>\n  <resources>\n");

    let settings = Resource {
        id: course.id.clone(),
        kind: ResourceType::LearningApplication,
        href: paths::CANVAS_EXPORT_FILE.to_string(),
        dependency: None,
    };
    let settings_files: Vec<String> = paths::COURSE_SETTINGS_RESOURCE_FILES
        .iter()
        .map(|f| f.to_string())
        .collect();
    render_resource(&mut out, &settings, &settings_files);

    for resource in &graph.resources {
        render_resource(&mut out, resource, &resource_files(resource));
    }
    for passthrough in &graph.passthrough {
        render_resource(&mut out, &passthrough.resource, &passthrough.files);
    }

    out.push_str("  </resources>\n</manifest>\n");
    out
}

/// `course_settings/module_meta.xml`
pub fn module_meta(modules: &[Module]) -> String {
    let mut out = format!("{}\n<modules {}>\n", XML_DECL, CANVAS_NS);

    for module in modules {
        out.push_str(&format!(
            r#"  <module identifier="{}">
    <title>{}</title>
    <workflow_state>{}</workflow_state>
    <position>{}</position>
    <require_sequential_progress>false</require_sequential_progress>
    <locked>false</locked>
    <items>
"#,
            escape(module.id.as_str()),
            escape(&module.title),
            module.state.as_str(),
            module.position
        ));
        for item in &module.items {
            out.push_str(&format!(
                r#"      <item identifier="{}">
        <content_type>{}</content_type>
        <workflow_state>{}</workflow_state>
        <title>{}</title>
        <identifierref>{}</identifierref>
        <position>{}</position>
        <new_tab/>
        <indent>0</indent>
        <link_settings_json>null</link_settings_json>
      </item>
"#,
                escape(item.id.as_str()),
                item.kind.item_content_type(),
                item.state.as_str(),
                escape(&item.title),
                escape(item.resource_ref.as_str()),
                item.position
            ));
        }
        out.push_str("    </items>\n  </module>\n");
    }

    out.push_str("</modules>\n");
    out
}

// ============================================================================
// Payload artifacts
// ============================================================================

pub fn wiki_page_html(page: &WikiPage) -> String {
    format!(
        r#"<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
<title>{title}</title>
<meta name="identifier" content="{resource}"/>
<meta name="page_identifier" content="{page}"/>
<meta name="editing_roles" content="teachers"/>
<meta name="workflow_state" content="{state}"/>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(&page.title),
        resource = escape(page.resource_id.as_str()),
        page = escape(page.id.as_str()),
        state = page.state.as_str(),
        body = page.body,
    )
}

pub fn assignment_settings(assignment: &Assignment, position: usize) -> String {
    format!(
        r#"{decl}
<assignment identifier="{id}" {ns}>
  <title>{title}</title>
  <due_at/>
  <lock_at/>
  <unlock_at/>
  <module_locked>false</module_locked>
  <assignment_group_identifierref>{group}</assignment_group_identifierref>
  <workflow_state>{state}</workflow_state>
  <assignment_overrides>
  </assignment_overrides>
  <allowed_extensions></allowed_extensions>
  <has_group_category>false</has_group_category>
  <points_possible>{points}</points_possible>
  <grading_type>points</grading_type>
  <all_day>false</all_day>
  <submission_types>on_paper</submission_types>
  <position>{position}</position>
{flags}</assignment>
"#,
        decl = XML_DECL,
        id = escape(assignment.id.as_str()),
        ns = CANVAS_NS,
        title = escape(&assignment.title),
        group = escape(assignment.grading_group_id.as_str()),
        state = assignment.state.as_str(),
        points = format_points(assignment.points),
        position = position,
        flags = indented(GRADING_FLAGS, "  "),
    )
}

pub fn assignment_html(assignment: &Assignment) -> String {
    format!(
        r#"<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
<title>Assignment: {}</title>
</head>
<body>
{}
</body>
</html>
"#,
        escape(&assignment.title),
        assignment.body
    )
}

pub fn quiz_meta(quiz: &Quiz, position: usize) -> String {
    format!(
        r#"{decl}
<quiz identifier="{id}" {ns}>
  <title>{title}</title>
  <description>{description}</description>
  <shuffle_answers>false</shuffle_answers>
  <scoring_policy>keep_highest</scoring_policy>
  <hide_results>always</hide_results>
  <quiz_type>assignment</quiz_type>
  <points_possible>{points}</points_possible>
  <require_lockdown_browser>false</require_lockdown_browser>
  <show_correct_answers>false</show_correct_answers>
  <anonymous_submissions>false</anonymous_submissions>
  <could_be_locked>false</could_be_locked>
  <allowed_attempts>1</allowed_attempts>
  <one_question_at_a_time>false</one_question_at_a_time>
  <cant_go_back>false</cant_go_back>
  <available>{available}</available>
  <one_time_results>false</one_time_results>
  <only_visible_to_overrides>false</only_visible_to_overrides>
  <module_locked>false</module_locked>
  <assignment identifier="{assignment}">
    <title>{title}</title>
    <due_at/>
    <lock_at/>
    <unlock_at/>
    <module_locked>false</module_locked>
    <assignment_group_identifierref>{group}</assignment_group_identifierref>
    <workflow_state>{state}</workflow_state>
    <assignment_overrides>
    </assignment_overrides>
    <quiz_identifierref>{id}</quiz_identifierref>
    <allowed_extensions></allowed_extensions>
    <has_group_category>false</has_group_category>
    <points_possible>{points}</points_possible>
    <grading_type>points</grading_type>
    <all_day>false</all_day>
    <submission_types>online_quiz</submission_types>
    <position>{position}</position>
{flags}  </assignment>
  <assignment_group_identifierref>{group}</assignment_group_identifierref>
  <assignment_overrides>
  </assignment_overrides>
</quiz>
"#,
        decl = XML_DECL,
        id = escape(quiz.id.as_str()),
        ns = CANVAS_NS,
        title = escape(&quiz.title),
        description = escape(&quiz.description),
        points = format_points(quiz.points),
        available = quiz.state.is_published(),
        assignment = escape(quiz.assignment_id.as_str()),
        group = escape(quiz.grading_group_id.as_str()),
        state = quiz.state.as_str(),
        position = position,
        flags = indented(GRADING_FLAGS, "    "),
    )
}

/// Answer idents of the fixed sample question; the second is correct
pub const SAMPLE_ANSWERS: [(&str, &str); 4] =
    [("5666", "3"), ("7024", "4"), ("7959", "5"), ("520", "6")];
pub const SAMPLE_CORRECT_ANSWER: &str = "7024";

/// QTI assessment with one fixed sample question
pub fn quiz_qti(quiz: &Quiz) -> String {
    let answer_ids: Vec<&str> = SAMPLE_ANSWERS.iter().map(|(id, _)| *id).collect();
    let labels: String = SAMPLE_ANSWERS
        .iter()
        .map(|(id, text)| {
            format!(
                r#"              <response_label ident="{}">
                <material>
                  <mattext texttype="text/plain">{}</mattext>
                </material>
              </response_label>
"#,
                id, text
            )
        })
        .collect();

    format!(
        r#"{decl}
<questestinterop {ns}>
  <assessment ident="{id}" title="{title}">
    <qtimetadata>
      <qtimetadatafield>
        <fieldlabel>cc_maxattempts</fieldlabel>
        <fieldentry>1</fieldentry>
      </qtimetadatafield>
    </qtimetadata>
    <section ident="root_section">
      <item ident="{question}" title="Question">
        <itemmetadata>
          <qtimetadata>
            <qtimetadatafield>
              <fieldlabel>question_type</fieldlabel>
              <fieldentry>multiple_choice_question</fieldentry>
            </qtimetadatafield>
            <qtimetadatafield>
              <fieldlabel>points_possible</fieldlabel>
              <fieldentry>{points}</fieldentry>
            </qtimetadatafield>
            <qtimetadatafield>
              <fieldlabel>original_answer_ids</fieldlabel>
              <fieldentry>{answer_ids}</fieldentry>
            </qtimetadatafield>
            <qtimetadatafield>
              <fieldlabel>assessment_question_identifierref</fieldlabel>
              <fieldentry>{assessment_question}</fieldentry>
            </qtimetadatafield>
          </qtimetadata>
        </itemmetadata>
        <presentation>
          <material>
            <mattext texttype="text/html">&lt;div&gt;&lt;p&gt;Sample question: What is 2 + 2?&lt;/p&gt;&lt;/div&gt;</mattext>
          </material>
          <response_lid ident="response1" rcardinality="Single">
            <render_choice>
{labels}            </render_choice>
          </response_lid>
        </presentation>
        <resprocessing>
          <outcomes>
            <decvar maxvalue="100" minvalue="0" varname="SCORE" vartype="Decimal"/>
          </outcomes>
          <respcondition continue="No">
            <conditionvar>
              <varequal respident="response1">{correct}</varequal>
            </conditionvar>
            <setvar action="Set" varname="SCORE">100</setvar>
          </respcondition>
        </resprocessing>
      </item>
    </section>
  </assessment>
</questestinterop>
"#,
        decl = XML_DECL,
        ns = QTI_NS,
        id = escape(quiz.id.as_str()),
        title = escape(&quiz.title),
        question = escape(quiz.question_id.as_str()),
        points = format_points(quiz.points),
        answer_ids = answer_ids.join(","),
        assessment_question = escape(quiz.assessment_question_id.as_str()),
        labels = labels,
        correct = SAMPLE_CORRECT_ANSWER,
    )
}

pub fn discussion_topic(discussion: &Discussion) -> String {
    format!(
        r#"{}
<topic {}>
  <title>{}</title>
  <text texttype="text/html">{}</text>
</topic>
"#,
        XML_DECL,
        TOPIC_NS,
        escape(&discussion.title),
        escape(&discussion.body)
    )
}

/// `topicMeta` document; `position` is the item position when attached
pub fn discussion_meta(discussion: &Discussion, position: Option<usize>) -> String {
    let position = position
        .map(|p| format!("<position>{}</position>", p))
        .unwrap_or_else(|| "<position/>".to_string());

    format!(
        r#"{decl}
<topicMeta identifier="{meta}" {ns}>
  <topic_id>{topic}</topic_id>
  <title>{title}</title>
  {position}
  <type>topic</type>
  <discussion_type>threaded</discussion_type>
  <has_group_category>false</has_group_category>
  <workflow_state>{state}</workflow_state>
  <module_locked>false</module_locked>
  <allow_rating>false</allow_rating>
  <only_graders_can_rate>false</only_graders_can_rate>
  <sort_by_rating>false</sort_by_rating>
  <sort_order>desc</sort_order>
  <sort_order_locked>false</sort_order_locked>
  <expanded>false</expanded>
  <expanded_locked>false</expanded_locked>
  <todo_date/>
  <locked>false</locked>
</topicMeta>
"#,
        decl = XML_DECL,
        meta = escape(discussion.meta_id.as_str()),
        ns = CANVAS_NS,
        topic = escape(discussion.topic_id.as_str()),
        title = escape(&discussion.title),
        position = position,
        state = discussion.state.as_discussion_str(),
    )
}

/// Course identity used by several boilerplate descriptors
pub fn course_settings(course: &CourseInfo) -> String {
    format!(
        r#"{decl}
<course identifier="{id}" {ns}>
  <title>{title}</title>
  <course_code>{code}</course_code>
  <start_at/>
  <conclude_at/>
  <is_public>false</is_public>
  <allow_student_wiki_edits>false</allow_student_wiki_edits>
  <lock_all_announcements>false</lock_all_announcements>
  <allow_student_organized_groups>true</allow_student_organized_groups>
  <default_view>modules</default_view>
  <allow_final_grade_override>false</allow_final_grade_override>
  <usage_rights_required>false</usage_rights_required>
  <restrict_student_future_view>false</restrict_student_future_view>
  <restrict_student_past_view>false</restrict_student_past_view>
  <homeroom_course>false</homeroom_course>
  <conditional_release>true</conditional_release>
  <grading_standard_enabled>false</grading_standard_enabled>
  <storage_quota>500000000</storage_quota>
  <overridden_course_visibility/>
  <root_account_uuid>{uuid}</root_account_uuid>
  <default_post_policy>
    <post_manually>false</post_manually>
  </default_post_policy>
  <enable_course_paces>false</enable_course_paces>
</course>
"#,
        decl = XML_DECL,
        id = escape(course.id.as_str()),
        ns = CANVAS_NS,
        title = escape(&course.title),
        code = escape(&course.code),
        uuid = escape(&course.root_account_uuid),
    )
}
