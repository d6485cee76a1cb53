use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Assignee, Employee, Task, TaskTemplate};
use crate::ops::bulk::BatchReport;
use crate::ops::completion::CompletionReceipt;
use crate::ops::grouping::TemplateGroup;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct GroupJson<'a> {
    pub name: String,
    pub expanded: bool,
    pub count: usize,
    pub active: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<&'a TaskTemplate>,
}

#[derive(Serialize)]
pub struct BatchJson {
    pub action: String,
    pub total: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailureJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

#[derive(Serialize)]
pub struct FailureJson {
    pub title: String,
    pub error: String,
    pub permission_denied: bool,
}

#[derive(Serialize)]
pub struct CompletionJson<'a> {
    pub task: &'a Task,
    pub hours: u32,
    pub minutes: u32,
    pub time_entry_date: &'a str,
    pub time_entry_client_id: &'a str,
}

#[derive(Serialize)]
pub struct EmployeeJson<'a> {
    pub id: &'a str,
    pub name: String,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn group_to_json<'a>(group: &TemplateGroup<'a>, with_templates: bool) -> GroupJson<'a> {
    GroupJson {
        name: group.key.clone(),
        expanded: group.expanded,
        count: group.templates.len(),
        active: group.active_count(),
        templates: if with_templates {
            group.templates.clone()
        } else {
            Vec::new()
        },
    }
}

pub fn batch_to_json<T>(action: &str, report: &BatchReport<T>) -> BatchJson {
    BatchJson {
        action: action.to_string(),
        total: report.len(),
        succeeded: report.succeeded().map(|(label, _)| label.to_string()).collect(),
        failed: report
            .failures()
            .map(|(label, e)| FailureJson {
                title: label.to_string(),
                error: e.to_string(),
                permission_denied: e.is_permission_denied(),
            })
            .collect(),
        refresh_error: report.refresh_error.as_ref().map(|e| e.to_string()),
    }
}

pub fn completion_to_json(receipt: &CompletionReceipt) -> CompletionJson<'_> {
    CompletionJson {
        task: &receipt.task,
        hours: receipt.spent.hours,
        minutes: receipt.spent.minutes,
        time_entry_date: &receipt.entry.date,
        time_entry_client_id: &receipt.entry.client_id,
    }
}

pub fn employee_to_json(employee: &Employee) -> EmployeeJson<'_> {
    EmployeeJson {
        id: employee.assignee_id(),
        name: employee.full_name(),
        email: &employee.email,
        position: employee.position.as_deref(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn id_or_dash(id: Option<&str>) -> &str {
    id.unwrap_or("-")
}

/// One-line template summary: `t1  Weekly report  (weekly, high)`
pub fn format_template_line(template: &TaskTemplate) -> String {
    let inactive = if template.is_active { "" } else { "  [inactive]" };
    format!(
        "{}  {}  ({}, {}){}",
        id_or_dash(template.id.as_deref()),
        template.title,
        template.frequency,
        template.priority,
        inactive
    )
}

pub fn format_assignee(assignee: &Assignee) -> String {
    format!("{:<8} {}  {}", assignee.kind.as_str(), assignee.id, assignee.display_name())
}

fn push_assignees(lines: &mut Vec<String>, assignees: &[Assignee]) {
    if assignees.is_empty() {
        lines.push("assignees: (none)".to_string());
    } else {
        lines.push("assignees:".to_string());
        for a in assignees {
            lines.push(format!("  {}", format_assignee(a)));
        }
    }
}

fn push_body(lines: &mut Vec<String>, label: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    lines.push(format!("{}:", label));
    for line in text.lines() {
        lines.push(format!("  {}", line));
    }
}

pub fn format_template_detail(template: &TaskTemplate) -> Vec<String> {
    let mut lines = vec![
        format!("{}  {}", id_or_dash(template.id.as_deref()), template.title),
        format!("frequency: {}", template.frequency),
        format!("priority: {}", template.priority),
        format!("job type: {}", template.job_type),
        format!("active: {}", if template.is_active { "yes" } else { "no" }),
    ];
    if !template.visible_to.is_empty() {
        lines.push(format!("visible to: {}", template.visible_to.join(", ")));
    }
    push_assignees(&mut lines, &template.assignees);
    push_body(&mut lines, "description", &template.description);
    lines
}

/// Group header: `▾ Acme (2)` when expanded, `▸ Acme (2)` when collapsed
pub fn format_group_header(group: &TemplateGroup<'_>) -> String {
    let marker = if group.expanded { '▾' } else { '▸' };
    let inactive = group.templates.len() - group.active_count();
    let inactive = if inactive > 0 {
        format!(", {} inactive", inactive)
    } else {
        String::new()
    };
    format!("{} {} ({}{})", marker, group.key, group.templates.len(), inactive)
}

pub fn format_task_line(task: &Task, today: NaiveDate) -> String {
    let due = if task.due_date.is_empty() {
        String::new()
    } else if task.is_overdue(today) {
        format!("  due {} (overdue)", task.due_date)
    } else {
        format!("  due {}", task.due_date)
    };
    format!(
        "{}  [{}] {}{}",
        id_or_dash(task.id.as_deref()),
        task.status,
        task.title,
        due
    )
}

pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![
        format!("{}  {}", id_or_dash(task.id.as_deref()), task.title),
        format!("status: {}", task.status),
        format!("priority: {}", task.priority),
        format!("job type: {}", task.job_type),
    ];
    if !task.due_date.is_empty() {
        lines.push(format!("due: {}", task.due_date));
    }
    if let Some(h) = task.estimated_hours {
        lines.push(format!("estimated: {}h", h));
    }
    if let Some(spent) = task.time_spent {
        lines.push(format!("time spent: {}", spent));
    }
    if let Some(template_id) = &task.template_id {
        lines.push(format!("from template: {}", template_id));
    }
    push_assignees(&mut lines, &task.assignees);
    push_body(&mut lines, "description", &task.description);
    if let Some(notes) = &task.completion_notes {
        push_body(&mut lines, "completion notes", notes);
    }
    lines
}

pub fn format_employee_line(employee: &Employee) -> String {
    format!(
        "{}  {}  <{}>",
        employee.assignee_id(),
        employee.full_name(),
        employee.email
    )
}

/// Per-item lines plus a summary: `2 of 3 created, 1 failed`
pub fn format_batch_report<T>(past_tense: &str, report: &BatchReport<T>) -> Vec<String> {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(_) => format!("ok    {}", o.label),
            Err(e) => format!("FAIL  {}: {}", o.label, e),
        })
        .collect();
    let failed = report.failure_count();
    let mut summary = format!("{} of {} {}", report.success_count(), report.len(), past_tense);
    if failed > 0 {
        summary.push_str(&format!(", {} failed", failed));
    }
    lines.push(summary);
    if let Some(e) = &report.refresh_error {
        lines.push(format!("warning: could not reload afterwards: {}", e));
    }
    lines
}

pub fn format_completion(receipt: &CompletionReceipt) -> String {
    let client = if receipt.entry.client_id.is_empty() {
        "no client".to_string()
    } else {
        format!("client {}", receipt.entry.client_id)
    };
    format!(
        "completed {} ({} on {}, {})",
        id_or_dash(receipt.task.id.as_deref()),
        receipt.spent,
        receipt.entry.date,
        client
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::model::{Frequency, Priority, TaskStatus};
    use crate::ops::bulk::ItemOutcome;
    use insta::assert_snapshot;

    fn sample_template() -> TaskTemplate {
        TaskTemplate {
            id: Some("t1".into()),
            title: "Weekly report".into(),
            description: "Summarize the week\nSend to the client".into(),
            frequency: Frequency::Weekly,
            priority: Priority::High,
            job_type: "reporting".into(),
            assignees: vec![
                Assignee::employee("e1", "Dana Reyes"),
                Assignee::client("c1", "Acme"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn template_line_marks_inactive() {
        let mut t = sample_template();
        assert_snapshot!(format_template_line(&t), @"t1  Weekly report  (weekly, high)");
        t.is_active = false;
        assert_snapshot!(format_template_line(&t), @"t1  Weekly report  (weekly, high)  [inactive]");
    }

    #[test]
    fn template_detail() {
        let lines = format_template_detail(&sample_template()).join("\n");
        assert_snapshot!(lines, @r"
        t1  Weekly report
        frequency: weekly
        priority: high
        job type: reporting
        active: yes
        assignees:
          employee e1  Dana Reyes
          client   c1  Acme
        description:
          Summarize the week
          Send to the client
        ");
    }

    #[test]
    fn group_header() {
        let t = sample_template();
        let mut off = sample_template();
        off.is_active = false;
        let group = TemplateGroup {
            key: "Acme".into(),
            templates: vec![&t, &off],
            expanded: false,
        };
        assert_snapshot!(format_group_header(&group), @"▸ Acme (2, 1 inactive)");
    }

    #[test]
    fn task_line_flags_overdue() {
        let task = Task {
            id: Some("k1".into()),
            title: "Edit promo".into(),
            status: TaskStatus::Active,
            due_date: "2024-06-01".into(),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_snapshot!(format_task_line(&task, today), @"k1  [active] Edit promo  due 2024-06-01 (overdue)");
    }

    #[test]
    fn batch_report_lines() {
        let report = BatchReport {
            outcomes: vec![
                ItemOutcome {
                    label: "Weekly report".to_string(),
                    result: Ok(()),
                },
                ItemOutcome {
                    label: "Invoice run".to_string(),
                    result: Err(ApiError::Forbidden("admins only".into())),
                },
            ],
            refresh_error: None,
        };
        assert_snapshot!(format_batch_report("deleted", &report).join("\n"), @r"
        ok    Weekly report
        FAIL  Invoice run: permission denied: admins only
        1 of 2 deleted, 1 failed
        ");

        let json = batch_to_json("delete", &report);
        assert_eq!(json.succeeded, vec!["Weekly report"]);
        assert!(json.failed[0].permission_denied);
    }
}
