use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use db::models::task::TaskPriority::{self, High, Low, Medium};

use super::{
    DemoActivity, DemoBoard, DemoColumn, DemoComment, DemoProject, DemoTag, DemoTask, DemoUser,
    Subtask, View, Workspace,
};
use crate::services::filter::TaskFilter;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_default()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn task(
    id: &str,
    title: &str,
    description: &str,
    priority: TaskPriority,
    due: (i32, u32, u32),
    assignees: &[&str],
    tags: &[&str],
) -> DemoTask {
    DemoTask {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        due_date: Some(date(due.0, due.1, due.2)),
        assignees: strings(assignees),
        tags: strings(tags),
        subtasks: Vec::new(),
        completed_subtasks: 0,
        comments: 0,
        attachments: 0,
        time_tracked: 0,
        recurrence: None,
        created_at: date(2024, 3, 1),
    }
}

impl DemoTask {
    fn subtasks(mut self, subtasks: &[(&str, &str, bool)]) -> Self {
        self.subtasks = subtasks
            .iter()
            .map(|(id, title, completed)| Subtask {
                id: id.to_string(),
                title: title.to_string(),
                completed: *completed,
            })
            .collect();
        self.recount_subtasks();
        self
    }

    fn counts(mut self, comments: u32, attachments: u32) -> Self {
        self.comments = comments;
        self.attachments = attachments;
        self
    }

    fn tracked(mut self, seconds: u64) -> Self {
        self.time_tracked = seconds;
        self
    }

    fn created(mut self, y: i32, m: u32, d: u32) -> Self {
        self.created_at = date(y, m, d);
        self
    }

    fn recurring(mut self, recurrence: &str) -> Self {
        self.recurrence = Some(recurrence.to_string());
        self
    }
}

fn column(id: &str, name: &str, color: &str, limit: Option<usize>, tasks: Vec<DemoTask>) -> DemoColumn {
    DemoColumn {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        limit,
        tasks,
    }
}

fn users() -> Vec<DemoUser> {
    [
        ("u1", "John Smith", "john@company.com", "admin"),
        ("u2", "Sarah Johnson", "sarah@company.com", "manager"),
        ("u3", "Mike Wilson", "mike@company.com", "developer"),
        ("u4", "Emily Davis", "emily@company.com", "designer"),
        ("u5", "Alex Chen", "alex@company.com", "developer"),
        ("u6", "Lisa Park", "lisa@company.com", "qa"),
    ]
    .into_iter()
    .map(|(id, name, email, role)| DemoUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
    })
    .collect()
}

fn tags() -> Vec<DemoTag> {
    [
        ("t1", "Design", "bg-blue-500"),
        ("t2", "Frontend", "bg-indigo-500"),
        ("t3", "Backend", "bg-emerald-500"),
        ("t4", "Mobile", "bg-violet-500"),
        ("t5", "Marketing", "bg-pink-500"),
        ("t6", "Research", "bg-cyan-500"),
        ("t7", "Documentation", "bg-slate-500"),
        ("t8", "DevOps", "bg-orange-500"),
        ("t9", "Security", "bg-red-500"),
        ("t10", "Analytics", "bg-amber-500"),
        ("t11", "Testing", "bg-teal-500"),
        ("t12", "UX", "bg-purple-500"),
    ]
    .into_iter()
    .map(|(id, name, color)| DemoTag {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

fn projects() -> Vec<DemoProject> {
    [
        ("p1", "Website Redesign 2024", "Complete overhaul of company website with modern UI/UX", "#3B82F6", true, &["u1", "u2", "u3", "u4"][..]),
        ("p2", "Mobile App v2.0", "Native iOS and Android app for customer engagement", "#8B5CF6", true, &["u1", "u3", "u5", "u6"][..]),
        ("p3", "Marketing Campaign Q2", "Spring marketing initiative and brand awareness", "#10B981", false, &["u2", "u4", "u6"][..]),
        ("p4", "Infrastructure Upgrade", "Cloud migration and server optimization", "#F59E0B", false, &["u1", "u3", "u5"][..]),
        ("p5", "Data Analytics Platform", "Business intelligence and data visualization", "#06B6D4", false, &["u1", "u2", "u3", "u4", "u5", "u6"][..]),
    ]
    .into_iter()
    .map(|(id, name, description, color, starred, members)| DemoProject {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        color: color.to_string(),
        starred,
        archived: false,
        members: strings(members),
    })
    .collect()
}

fn main_development() -> DemoBoard {
    DemoBoard {
        id: "b1".to_string(),
        project_id: "p1".to_string(),
        name: "Main Development".to_string(),
        columns: vec![
            column("c1", "Backlog", "#64748B", None, vec![
                task("t1", "Conduct user research interviews", "Interview 10 potential users about their pain points and needs for the new website design.", High, (2024, 4, 15), &["u2"], &["Research", "Design"])
                    .subtasks(&[("s1", "Create interview guide", true), ("s2", "Recruit participants", true), ("s3", "Schedule interviews", false), ("s4", "Conduct interviews", false)])
                    .counts(5, 2),
                task("t2", "Create mood board", "Collect design inspiration and create visual mood board for the new website.", Medium, (2024, 4, 20), &["u4"], &["Design", "Research"])
                    .counts(3, 5)
                    .created(2024, 3, 5),
                task("t20", "Performance optimization audit", "Conduct a comprehensive audit of current website performance and identify improvement areas.", Low, (2024, 5, 1), &["u3"], &["DevOps", "Performance"])
                    .counts(1, 0)
                    .created(2024, 3, 12),
            ]),
            column("c2", "To Do", "#3B82F6", Some(5), vec![
                task("t3", "Design system components", "Create reusable UI component library including buttons, inputs, cards, modals, and navigation elements.", High, (2024, 4, 10), &["u1", "u4"], &["Design", "Frontend"])
                    .subtasks(&[("s5", "Buttons & inputs", true), ("s6", "Cards & containers", true), ("s7", "Modals & dialogs", false), ("s8", "Navigation components", false)])
                    .counts(12, 3)
                    .tracked(7200)
                    .created(2024, 3, 10),
                task("t4", "Setup CI/CD pipeline", "Configure automated testing and deployment pipeline using GitHub Actions.", High, (2024, 4, 5), &["u3"], &["DevOps", "Backend"])
                    .subtasks(&[("s9", "Configure GitHub Actions", true), ("s10", "Set up automated tests", false), ("s11", "Configure deployment", false)])
                    .counts(8, 1)
                    .tracked(3600)
                    .created(2024, 3, 12),
                task("t5", "Write API documentation", "Document all REST endpoints with examples, request/response schemas, and authentication guides.", Low, (2024, 4, 25), &["u3", "u5"], &["Documentation", "Backend"])
                    .counts(4, 2)
                    .created(2024, 3, 14),
                task("t21", "SEO optimization", "Implement meta tags, sitemaps, and structured data for better search engine visibility.", Medium, (2024, 4, 18), &["u2"], &["Marketing", "SEO"])
                    .counts(2, 0)
                    .created(2024, 3, 15),
            ]),
            column("c3", "In Progress", "#F59E0B", Some(3), vec![
                task("t6", "Homepage redesign", "Create new homepage layout with hero section, features showcase, and call-to-action buttons.", High, (2024, 4, 1), &["u1", "u4"], &["Design", "Frontend"])
                    .subtasks(&[("s12", "Wireframe creation", true), ("s13", "High-fidelity mockup", true), ("s14", "Responsive implementation", false), ("s15", "Cross-browser testing", false)])
                    .counts(15, 8)
                    .tracked(14400)
                    .created(2024, 3, 8),
                task("t7", "User authentication system", "Implement OAuth2 login with social providers (Google, GitHub, LinkedIn).", High, (2024, 4, 3), &["u3", "u5"], &["Backend", "Security"])
                    .subtasks(&[("s16", "OAuth2 setup", true), ("s17", "JWT implementation", false), ("s18", "Session management", false), ("s19", "Security testing", false)])
                    .counts(9, 0)
                    .tracked(10800)
                    .created(2024, 3, 6),
                task("t22", "Mobile responsiveness", "Ensure all pages are fully responsive and work seamlessly on mobile devices.", High, (2024, 3, 28), &["u1"], &["Frontend", "Mobile"])
                    .subtasks(&[("s20", "Breakpoint testing", true), ("s21", "Touch interaction testing", false), ("s22", "Performance on mobile", false)])
                    .counts(6, 2)
                    .tracked(5400)
                    .created(2024, 3, 16),
            ]),
            column("c4", "Review", "#8B5CF6", Some(2), vec![
                task("t8", "Landing page A/B test", "Run comparison test on new landing page variants to determine best conversion rate.", Medium, (2024, 3, 28), &["u2", "u6"], &["Marketing", "Analytics"])
                    .counts(11, 4),
                task("t23", "Accessibility audit", "Conduct WCAG 2.1 AA compliance audit and fix any issues found.", Medium, (2024, 3, 30), &["u4", "u6"], &["Design", "Accessibility"])
                    .subtasks(&[("s23", "Automated testing", true), ("s24", "Manual testing", false), ("s25", "Fix issues", false)])
                    .counts(7, 1)
                    .tracked(7200)
                    .created(2024, 3, 17),
            ]),
            column("c5", "Done", "#10B981", None, vec![
                task("t9", "Project kickoff meeting", "Initial team alignment, scope discussion, and milestone planning.", Medium, (2024, 2, 15), &["u1", "u2"], &["Planning"])
                    .counts(18, 3)
                    .created(2024, 2, 1),
                task("t10", "Requirements gathering", "Collect and document all project requirements from stakeholders.", High, (2024, 2, 28), &["u1", "u2", "u4"], &["Planning", "Research"])
                    .subtasks(&[("s26", "Stakeholder interviews", true), ("s27", "Requirements document", true), ("s28", "Approval sign-off", true)])
                    .counts(24, 8)
                    .tracked(18000)
                    .created(2024, 2, 5),
                task("t11", "Technical architecture design", "Define system architecture, tech stack, and data models.", High, (2024, 3, 5), &["u1", "u3", "u5"], &["Architecture", "Backend"])
                    .counts(14, 5)
                    .created(2024, 2, 10),
                task("t12", "Development environment setup", "Configure development tools, linting, and code standards.", Low, (2024, 3, 1), &["u3"], &["DevOps"])
                    .counts(6, 0)
                    .created(2024, 2, 20),
                task("t13", "Brand guidelines update", "Update brand guidelines document with new color palette and typography.", Medium, (2024, 3, 10), &["u4"], &["Design", "Brand"])
                    .counts(8, 3)
                    .created(2024, 2, 25),
            ]),
        ],
    }
}

fn development_sprint() -> DemoBoard {
    DemoBoard {
        id: "b2".to_string(),
        project_id: "p2".to_string(),
        name: "Development Sprint".to_string(),
        columns: vec![
            column("c6", "Sprint Backlog", "#64748B", None, vec![
                task("t14", "Push notification integration", "Implement FCM for push notifications on both iOS and Android.", High, (2024, 4, 12), &["u3", "u5"], &["Mobile", "Backend"])
                    .counts(4, 0)
                    .created(2024, 3, 15),
                task("t15", "Offline data sync", "Implement local database and offline-first sync functionality.", High, (2024, 4, 20), &["u5"], &["Mobile", "Backend"])
                    .counts(6, 1)
                    .created(2024, 3, 16),
            ]),
            column("c7", "In Development", "#F59E0B", Some(4), vec![
                task("t16", "Onboarding flow", "Create smooth onboarding experience for new users with tutorial slides.", High, (2024, 4, 8), &["u1", "u4"], &["Mobile", "UX"])
                    .subtasks(&[("s29", "Welcome screen", true), ("s30", "Tutorial slides", true), ("s31", "Preference selection", false)])
                    .counts(11, 2)
                    .tracked(12600)
                    .created(2024, 3, 10),
                task("t17", "Dark mode implementation", "Add full dark mode support throughout the app.", Medium, (2024, 4, 15), &["u1"], &["Mobile", "Design"])
                    .counts(3, 0)
                    .created(2024, 3, 17),
            ]),
            column("c8", "Testing", "#8B5CF6", Some(3), vec![
                task("t18", "Payment gateway integration", "Stripe integration for in-app purchases and subscriptions.", High, (2024, 4, 2), &["u3"], &["Mobile", "Payments"])
                    .counts(14, 3)
                    .created(2024, 3, 5),
                task("t19", "Biometric authentication", "Implement Face ID and Touch ID authentication.", Medium, (2024, 4, 10), &["u5"], &["Mobile", "Security"])
                    .counts(5, 0)
                    .created(2024, 3, 18),
            ]),
            column("c9", "Released", "#10B981", None, vec![
                task("t26", "App store submission", "Prepare and submit app to App Store and Google Play.", High, (2024, 3, 20), &["u1", "u3", "u4", "u6"], &["Mobile", "Release"])
                    .subtasks(&[("s32", "Screenshots & video", true), ("s33", "App description", true), ("s34", "Privacy policy", true), ("s35", "Test flight setup", true)])
                    .counts(28, 8)
                    .tracked(28800)
                    .recurring("monthly"),
            ]),
        ],
    }
}

fn campaign_board() -> DemoBoard {
    DemoBoard {
        id: "b3".to_string(),
        project_id: "p3".to_string(),
        name: "Campaign Board".to_string(),
        columns: vec![
            column("c10", "Ideas", "#64748B", None, vec![
                task("t27", "Social media giveaways", "Plan Instagram and Twitter giveaway campaigns for Q2.", Medium, (2024, 4, 15), &["u2"], &["Social Media", "Marketing"])
                    .counts(5, 0)
                    .created(2024, 3, 16),
            ]),
            column("c11", "Planning", "#3B82F6", Some(5), vec![
                task("t28", "Email newsletter series", "Create 5-part email drip campaign for lead nurturing.", High, (2024, 4, 12), &["u2", "u4"], &["Email", "Marketing"])
                    .subtasks(&[("s36", "Email 1 - Welcome", true), ("s37", "Email 2 - Feature highlight", true), ("s38", "Email 3 - Case study", true), ("s39", "Email 4 - Testimonial", false)])
                    .counts(9, 4)
                    .tracked(16200)
                    .created(2024, 3, 8),
            ]),
            column("c12", "In Progress", "#F59E0B", Some(3), vec![
                task("t29", "Blog content calendar", "Plan and schedule Q2 blog posts for SEO and engagement.", Medium, (2024, 4, 5), &["u4"], &["Content", "SEO"])
                    .counts(6, 2)
                    .created(2024, 3, 12),
            ]),
            column("c13", "Published", "#10B981", None, vec![
                task("t30", "Product launch press release", "Draft and distribute press release for new feature launch.", High, (2024, 3, 25), &["u2"], &["PR", "Launch"])
                    .counts(15, 5),
                task("t31", "Customer case study", "Create detailed case study showcasing customer success story.", Medium, (2024, 3, 20), &["u2", "u4"], &["Content", "Marketing"])
                    .subtasks(&[("s40", "Customer interview", true), ("s41", "Write draft", true), ("s42", "Design layout", true)])
                    .counts(12, 6)
                    .tracked(21600)
                    .created(2024, 3, 5),
            ]),
        ],
    }
}

fn comments() -> Vec<DemoComment> {
    [
        ("cm1", "t1", "u2", "Great progress! Let's schedule a review meeting.", at(2024, 3, 10, 14, 30)),
        ("cm2", "t1", "u1", "Agreed! I'll set up the meeting for tomorrow.", at(2024, 3, 10, 15, 0)),
        ("cm3", "t3", "u3", "I've completed the API documentation draft. Please review.", at(2024, 3, 11, 9, 15)),
        ("cm4", "t6", "u4", "New design mocks are ready for review!", at(2024, 3, 11, 11, 45)),
    ]
    .into_iter()
    .map(|(id, task_id, user_id, content, created_at)| DemoComment {
        id: id.to_string(),
        task_id: task_id.to_string(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        created_at,
    })
    .collect()
}

fn activities() -> Vec<DemoActivity> {
    let mut activities: Vec<DemoActivity> = [
        ("a1", "u1", "created", Some("task"), "Homepage redesign", at(2024, 3, 8, 10, 30)),
        ("a2", "u2", "completed", Some("subtask"), "Wireframe", at(2024, 3, 8, 14, 15)),
        ("a3", "u3", "commented on", Some("task"), "User authentication", at(2024, 3, 9, 9, 0)),
        ("a4", "u1", "moved", None, "Design system components", at(2024, 3, 9, 11, 45)),
        ("a5", "u4", "attached", Some("file"), "mockup-v2.fig", at(2024, 3, 10, 8, 20)),
        ("a6", "u2", "created", Some("task"), "Landing page A/B test", at(2024, 3, 10, 9, 30)),
        ("a7", "u1", "completed", None, "Project kickoff", at(2024, 3, 11, 16, 0)),
        ("a8", "u3", "uploaded", Some("file"), "api-docs.pdf", at(2024, 3, 11, 17, 30)),
    ]
    .into_iter()
    .map(|(id, user_id, action, entity_type, entity_name, created_at)| DemoActivity {
        id: id.to_string(),
        user_id: user_id.to_string(),
        action: action.to_string(),
        entity_type: entity_type.map(str::to_string),
        entity_name: entity_name.to_string(),
        project_id: "p1".to_string(),
        created_at,
    })
    .collect();
    activities.reverse();
    activities
}

/// Fresh copy of the demo dataset, opened on the first project's board view.
pub fn seeded_workspace() -> Workspace {
    Workspace {
        projects: projects(),
        boards: vec![main_development(), development_sprint(), campaign_board()],
        users: users(),
        tags: tags(),
        comments: comments(),
        activities: activities(),
        current_project: "p1".to_string(),
        current_board: "b1".to_string(),
        current_view: View::Board,
        search_query: String::new(),
        filters: TaskFilter::default(),
        bulk_selection: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn task_ids_are_unique_across_boards() {
        let workspace = seeded_workspace();
        let ids: Vec<&str> = workspace
            .boards
            .iter()
            .flat_map(|b| &b.columns)
            .flat_map(|c| &c.tasks)
            .map(|t| t.id.as_str())
            .collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn seeded_columns_respect_their_limits() {
        let workspace = seeded_workspace();
        for column in workspace.boards.iter().flat_map(|b| &b.columns) {
            if let Some(limit) = column.limit {
                assert!(column.tasks.len() <= limit, "{} over its limit", column.name);
            }
        }
    }

    #[test]
    fn activity_feed_is_newest_first() {
        let workspace = seeded_workspace();
        assert_eq!(workspace.activities[0].id, "a8");
        assert!(
            workspace
                .activities
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );
    }
}
