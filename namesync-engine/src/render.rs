//! Name rendering — pure mapping from a task set + rule to a display name.

use namesync_core::types::{Rule, Task};

/// Render the display name for `rule` from its outstanding tasks.
///
/// Non-empty task set: titles sorted by `position` (stable, plain byte
/// order — ties keep fetch order), joined with the rule separator, wrapped
/// with the beginning/end text. Empty task set: the rule's normal name,
/// regardless of the text fields.
///
/// Pure and deterministic; the adapters guarantee every task carries a
/// string `position` before it reaches this function.
pub fn render(tasks: &[Task], rule: &Rule) -> String {
    if tasks.is_empty() {
        return rule.normal_name.clone();
    }

    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| a.position.cmp(&b.position));

    let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
    format!(
        "{}{}{}",
        rule.beginning_text,
        titles.join(&rule.separator),
        rule.end_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use namesync_core::types::{TaskListId, UserId};

    fn rule(beginning: &str, separator: &str, end: &str, normal: &str) -> Rule {
        let now = Utc::now();
        Rule {
            user_id: UserId::from("u-1"),
            task_list_id: TaskListId::from("inbox"),
            beginning_text: beginning.to_string(),
            separator: separator.to_string(),
            end_text: end.to_string(),
            normal_name: normal.to_string(),
            enabled: true,
            last_generated_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(title: &str, position: &str) -> Task {
        Task {
            title: title.to_string(),
            position: position.to_string(),
        }
    }

    #[test]
    fn empty_task_set_yields_normal_name() {
        let rule = rule("Alex@", "、", "!", "Alex");
        assert_eq!(render(&[], &rule), "Alex");
    }

    #[test]
    fn joins_titles_sorted_by_position() {
        let rule = rule("Alex@", "、", "", "Alex");
        let tasks = vec![task("Call Bob", "b"), task("Buy milk", "a")];
        assert_eq!(render(&tasks, &rule), "Alex@Buy milk、Call Bob");
    }

    #[test]
    fn single_task_has_no_separator() {
        let rule = rule("[", " / ", "]", "Quiet");
        let tasks = vec![task("Only one", "a")];
        assert_eq!(render(&tasks, &rule), "[Only one]");
    }

    #[test]
    fn permutations_render_identically() {
        let rule = rule("", " | ", "", "Quiet");
        let a = vec![task("one", "1"), task("two", "2"), task("three", "3")];
        let b = vec![task("three", "3"), task("one", "1"), task("two", "2")];
        assert_eq!(render(&a, &rule), render(&b, &rule));
        assert_eq!(render(&a, &rule), "one | two | three");
    }

    #[test]
    fn position_ordering_is_lexicographic_not_numeric() {
        let rule = rule("", ",", "", "Quiet");
        // "10" < "9" in byte order.
        let tasks = vec![task("nine", "9"), task("ten", "10")];
        assert_eq!(render(&tasks, &rule), "ten,nine");
    }

    #[test]
    fn equal_positions_keep_fetch_order() {
        let rule = rule("", ",", "", "Quiet");
        let tasks = vec![task("first", "same"), task("second", "same")];
        assert_eq!(render(&tasks, &rule), "first,second");
    }

    #[test]
    fn input_order_is_untouched() {
        let rule = rule("", ",", "", "Quiet");
        let tasks = vec![task("b-title", "b"), task("a-title", "a")];
        let _ = render(&tasks, &rule);
        assert_eq!(tasks[0].title, "b-title");
    }
}
