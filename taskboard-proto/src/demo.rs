//! Demo data set: three projects with sections and sample tasks.
//!
//! Seeds the mock backend and the in-memory collaborator so the board can
//! be exercised without a real backend.

use chrono::NaiveDate;

use crate::ledger::Ledger;
use crate::section::Section;
use crate::task::{Task, TaskPriority, TaskStatus};

/// Projects included in the demo data set.
pub const PROJECT_IDS: [&str; 3] = ["proj-1", "proj-2", "proj-3"];

const SECTIONS: &[(&str, &str, &str, u32)] = &[
    ("sec-1-1", "proj-1", "Backlog", 0),
    ("sec-1-2", "proj-1", "To Do", 1),
    ("sec-1-3", "proj-1", "In Progress", 2),
    ("sec-1-4", "proj-1", "Review", 3),
    ("sec-1-5", "proj-1", "Done", 4),
    ("sec-2-1", "proj-2", "Planning", 0),
    ("sec-2-2", "proj-2", "Development", 1),
    ("sec-2-3", "proj-2", "Testing", 2),
    ("sec-2-4", "proj-2", "Deployment", 3),
    ("sec-3-1", "proj-3", "Ideas", 0),
    ("sec-3-2", "proj-3", "In Progress", 1),
    ("sec-3-3", "proj-3", "Scheduled", 2),
    ("sec-3-4", "proj-3", "Published", 3),
];

struct DemoTask {
    id: &'static str,
    section: &'static str,
    project: &'static str,
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: TaskPriority,
    assignee: &'static str,
    due: Option<(i32, u32, u32)>,
    tags: [&'static str; 2],
}

macro_rules! demo_task {
    ($id:literal, $section:literal, $project:literal, $title:literal, $desc:literal,
     $status:ident, $priority:ident, $assignee:literal, $due:expr, [$t1:literal, $t2:literal]) => {
        DemoTask {
            id: $id,
            section: $section,
            project: $project,
            title: $title,
            description: $desc,
            status: TaskStatus::$status,
            priority: TaskPriority::$priority,
            assignee: $assignee,
            due: $due,
            tags: [$t1, $t2],
        }
    };
}

const TASKS: &[DemoTask] = &[
    demo_task!("task-1", "sec-1-1", "proj-1", "Research competitor websites", "Analyze top 10 competitor sites for design trends", Todo, Low, "user-3", None, ["research", "design"]),
    demo_task!("task-2", "sec-1-1", "proj-1", "Create mood board", "Compile visual inspiration and color palettes", Todo, Medium, "user-2", None, ["design", "creative"]),
    demo_task!("task-3", "sec-1-1", "proj-1", "Define site architecture", "Map out all pages and navigation structure", Todo, High, "user-1", Some((2024, 2, 15)), ["planning", "ux"]),
    demo_task!("task-4", "sec-1-2", "proj-1", "Design homepage mockup", "Create high-fidelity mockup for homepage", Todo, High, "user-2", Some((2024, 2, 10)), ["design", "urgent"]),
    demo_task!("task-5", "sec-1-2", "proj-1", "Write homepage copy", "Draft compelling copy for all homepage sections", Todo, Medium, "user-4", Some((2024, 2, 12)), ["content", "marketing"]),
    demo_task!("task-6", "sec-1-2", "proj-1", "Select hero images", "Choose and optimize hero section images", Todo, Medium, "user-3", None, ["design", "assets"]),
    demo_task!("task-7", "sec-1-3", "proj-1", "Implement responsive navigation", "Build mobile-responsive navigation menu", InProgress, High, "user-1", Some((2024, 2, 8)), ["development", "frontend"]),
    demo_task!("task-8", "sec-1-3", "proj-1", "Set up CMS integration", "Connect Contentful CMS to website", InProgress, Urgent, "user-3", Some((2024, 2, 7)), ["backend", "integration"]),
    demo_task!("task-9", "sec-1-4", "proj-1", "Review contact form functionality", "Test all form validations and email notifications", InReview, Medium, "user-2", None, ["testing", "qa"]),
    demo_task!("task-10", "sec-1-4", "proj-1", "Accessibility audit", "Ensure WCAG 2.1 AA compliance", InReview, High, "user-4", Some((2024, 2, 9)), ["accessibility", "qa"]),
    demo_task!("task-11", "sec-1-5", "proj-1", "Setup project repository", "Initialize Git repo and CI/CD pipeline", Done, Low, "user-1", None, ["setup", "devops"]),
    demo_task!("task-12", "sec-1-5", "proj-1", "Configure development environment", "Set up local dev environment for team", Done, Medium, "user-3", None, ["setup", "development"]),
    demo_task!("task-13", "sec-2-1", "proj-2", "Define user personas", "Create detailed user personas for app", Todo, High, "user-2", Some((2024, 2, 11)), ["research", "ux"]),
    demo_task!("task-14", "sec-2-1", "proj-2", "Feature prioritization", "Prioritize features for MVP release", Todo, Urgent, "user-1", Some((2024, 2, 10)), ["planning", "product"]),
    demo_task!("task-15", "sec-2-2", "proj-2", "Implement authentication flow", "Build login/signup screens with OAuth", InProgress, High, "user-3", Some((2024, 2, 13)), ["development", "security"]),
    demo_task!("task-16", "sec-2-2", "proj-2", "Create onboarding screens", "Design and implement app onboarding", InProgress, Medium, "user-4", None, ["development", "ux"]),
    demo_task!("task-17", "sec-2-2", "proj-2", "Build push notifications", "Integrate FCM for push notifications", Todo, Medium, "user-1", Some((2024, 2, 15)), ["development", "backend"]),
    demo_task!("task-18", "sec-2-3", "proj-2", "Unit test authentication", "Write comprehensive unit tests for auth module", Todo, Medium, "user-3", None, ["testing", "qa"]),
    demo_task!("task-19", "sec-3-1", "proj-3", "Brainstorm social media campaign", "Generate ideas for Q1 social campaign", Todo, Low, "user-4", None, ["marketing", "creative"]),
    demo_task!("task-20", "sec-3-1", "proj-3", "Research influencer partnerships", "Identify potential influencer collaborations", Todo, Medium, "user-2", None, ["marketing", "partnerships"]),
    demo_task!("task-21", "sec-3-2", "proj-3", "Write blog post series", "Create 5-part blog series on industry trends", InProgress, High, "user-4", Some((2024, 2, 14)), ["content", "blog"]),
    demo_task!("task-22", "sec-3-2", "proj-3", "Design email newsletter", "Create responsive email template", InProgress, Medium, "user-2", Some((2024, 2, 12)), ["design", "email"]),
    demo_task!("task-23", "sec-3-3", "proj-3", "Valentine's Day promotion", "Launch special Valentine's Day offer", Todo, Urgent, "user-1", Some((2024, 2, 14)), ["campaign", "promotion"]),
    demo_task!("task-24", "sec-3-4", "proj-3", "January newsletter", "Monthly newsletter sent to subscribers", Done, Medium, "user-4", None, ["email", "newsletter"]),
    demo_task!("task-25", "sec-3-4", "proj-3", "New Year campaign", "New Year resolution campaign completed", Done, High, "user-2", None, ["campaign", "social"]),
];

/// Sections of the demo data set, in board order per project.
#[must_use]
pub fn sections() -> Vec<Section> {
    SECTIONS
        .iter()
        .map(|&(id, project, name, order)| Section::new(id, project, name, order))
        .collect()
}

/// A ledger seeded with every demo section and task.
#[must_use]
pub fn ledger() -> Ledger {
    let mut ledger = Ledger::new();
    for section in sections() {
        ledger.add_section(section);
    }
    for demo in TASKS {
        let mut task = Task::new(demo.id, demo.title, demo.project)
            .with_description(demo.description)
            .with_status(demo.status)
            .with_priority(demo.priority)
            .with_assignee(demo.assignee)
            .with_tags(demo.tags);
        if let Some(due) = demo
            .due
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        {
            task = task.with_due_date(due);
        }
        // Every demo section is registered above, so placement cannot fail.
        let _ = ledger.insert_task(&demo.section.into(), task);
    }
    ledger
}
