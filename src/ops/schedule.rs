use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::model::{Frequency, Task, TaskStatus, TaskTemplate};

/// Due date of the task `template` produces on `date`, if it produces one.
///
/// Daily templates produce every day, due the next day. Weekly templates
/// produce on Sundays only, due a week later. Inactive templates never
/// produce.
pub fn due_date_for(template: &TaskTemplate, date: NaiveDate) -> Option<NaiveDate> {
    if !template.is_active {
        return None;
    }
    match template.frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly if date.weekday() == Weekday::Sun => date.checked_add_days(Days::new(7)),
        Frequency::Weekly => None,
    }
}

/// A new open task carrying the template's fields
pub fn task_from_template(template: &TaskTemplate, due: NaiveDate) -> Task {
    Task {
        title: template.title.clone(),
        description: template.description.clone(),
        status: TaskStatus::Active,
        priority: template.priority,
        due_date: due.format("%Y-%m-%d").to_string(),
        job_type: template.job_type.clone(),
        assignees: template.assignees.clone(),
        visible_to: template.visible_to.clone(),
        template_id: template.id.clone(),
        created_by: template.created_by.clone(),
        ..Default::default()
    }
}

/// The tasks the scheduler would create on `date`, in template order
pub fn due_tasks(templates: &[TaskTemplate], date: NaiveDate) -> Vec<Task> {
    templates
        .iter()
        .filter_map(|t| due_date_for(t, date).map(|due| task_from_template(t, due)))
        .collect()
}
