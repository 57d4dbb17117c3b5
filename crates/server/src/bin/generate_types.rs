//! Writes the TypeScript declarations of every API type to `shared/types.ts`.
//!
//! `cargo run --bin generate_types -- --check` fails when the file is out of date.

use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let header = "// This file was generated by `generate_types`. Do not edit it by hand.\n\n";
    let decls = [
        db::models::board::Board::decl(),
        db::models::board::CreateBoard::decl(),
        db::models::board::UpdateBoard::decl(),
        db::models::column::Column::decl(),
        db::models::column::ColumnWithTasks::decl(),
        db::models::column::UpdateColumn::decl(),
        db::models::task::TaskPriority::decl(),
        db::models::task::Task::decl(),
        db::models::task::CreateTask::decl(),
        db::models::task::UpdateTask::decl(),
        db::models::task::MoveTask::decl(),
        db::models::message::Message::decl(),
        db::models::message::CreateMessage::decl(),
        db::models::activity::Activity::decl(),
        db::models::activity::CreateActivity::decl(),
        db::models::tag::Tag::decl(),
        db::models::tag::CreateTag::decl(),
        db::models::tag::TaskTag::decl(),
        db::models::checklist::Checklist::decl(),
        db::models::checklist::ChecklistItem::decl(),
        db::models::checklist::ChecklistWithItems::decl(),
        db::models::checklist::CreateChecklist::decl(),
        db::models::checklist::CreateChecklistItem::decl(),
        db::models::checklist::UpdateChecklistItem::decl(),
        db::models::comment::Comment::decl(),
        db::models::comment::CreateComment::decl(),
        db::models::comment::UpdateComment::decl(),
        db::models::time_entry::TimeEntry::decl(),
        db::models::time_entry::StartTimer::decl(),
        db::models::custom_field::CustomField::decl(),
        db::models::custom_field::CreateCustomField::decl(),
        db::models::custom_field::TaskCustomFieldValue::decl(),
        db::models::custom_field::SetFieldValue::decl(),
        db::models::milestone::Milestone::decl(),
        db::models::milestone::CreateMilestone::decl(),
        db::models::milestone::UpdateMilestone::decl(),
        db::models::recurring_task::RecurringTask::decl(),
        db::models::recurring_task::CreateRecurringTask::decl(),
        db::models::recurring_task::UpdateRecurringTask::decl(),
        db::models::task_relation::TaskRelation::decl(),
        db::models::task_relation::CreateTaskRelation::decl(),
        services::services::board_data::BoardWithColumns::decl(),
        services::services::filter::TaskFilter::decl(),
        services::services::filter::TaskFilterQuery::decl(),
        services::services::filter::TaskFilterPatch::decl(),
        services::services::storage::Attachment::decl(),
        services::services::config::UploadConfig::decl(),
        services::services::demo::View::decl(),
        services::services::demo::DemoUser::decl(),
        services::services::demo::DemoTag::decl(),
        services::services::demo::DemoProject::decl(),
        services::services::demo::Subtask::decl(),
        services::services::demo::DemoTask::decl(),
        services::services::demo::DemoColumn::decl(),
        services::services::demo::DemoBoard::decl(),
        services::services::demo::DemoComment::decl(),
        services::services::demo::DemoActivity::decl(),
        services::services::demo::Workspace::decl(),
        services::services::demo::NewDemoProject::decl(),
        services::services::demo::NewDemoTask::decl(),
        services::services::demo::DemoTaskChanges::decl(),
        services::services::demo::NewDemoActivity::decl(),
        services::services::demo::DemoAction::decl(),
        services::services::demo::DemoState::decl(),
        utils::feed_msg::FeedChannel::decl(),
        utils::feed_msg::FeedMsg::decl(),
        server::routes::columns::CreateColumnRequest::decl(),
        server::routes::config::ConfigInfo::decl(),
        server::routes::time_entries::TimeTotal::decl(),
        server::routes::activities::ActivityQuery::decl(),
        server::routes::attachments::AttachmentKeyQuery::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| {
            let trimmed = decl.trim_start();
            if trimmed.starts_with("export") {
                trimmed.to_string()
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{header}{body}\n")
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let types_path = shared_path.join("types.ts");

    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date.");
            std::process::exit(0);
        } else {
            eprintln!("shared/types.ts is not up to date. Run `cargo run --bin generate_types`.");
            std::process::exit(1);
        }
    }

    fs::create_dir_all(&shared_path).expect("cannot create shared/");
    fs::write(&types_path, generated).expect("unable to write types.ts");
    println!("Wrote {}", types_path.display());
}
