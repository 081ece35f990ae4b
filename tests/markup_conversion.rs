// File: tests/markup_conversion.rs
use minutes::extract::extract_action_items_count;
use minutes::markup::{
    Block, TaskStatus, convert, convert_due_date_to_time_tag, convert_with_ids, parse_blocks,
};

fn sequential_ids() -> impl FnMut() -> String {
    let mut n = 0;
    move || {
        n += 1;
        format!("task-{}", n)
    }
}

#[test]
fn test_single_checkbox_becomes_task_element() {
    let out = convert_with_ids("- [ ] Fix bug — @alice — Due: 2025-10-27", sequential_ids());
    assert_eq!(
        out,
        "<ac:task-list>\n\
         <ac:task><ac:task-id>task-1</ac:task-id><ac:task-status>incomplete</ac:task-status>\
         <ac:task-body><span class=\"placeholder-inline-tasks\">Fix bug — @alice — \
         <time datetime=\"2025-10-27\"></time></span></ac:task-body></ac:task>\n\
         </ac:task-list>"
    );
}

#[test]
fn test_headings_lists_and_paragraphs() {
    let md = "# Weekly sync\n## Agenda\n- Coupon sync\n### Notes\nDiscussed rollout.";
    let out = convert_with_ids(md, sequential_ids());
    assert_eq!(
        out,
        "<h1>Weekly sync</h1>\n<h2>Agenda</h2>\n<li>Coupon sync</li>\n<h3>Notes</h3>\n<p>Discussed rollout.</p>"
    );
}

#[test]
fn test_heading_splits_task_lists() {
    let md = "- [ ] one\n- [x] two\n## Later\n- [ ] three";
    let blocks = parse_blocks(md, sequential_ids());
    let lists: Vec<&Vec<_>> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::TaskList(tasks) => Some(tasks),
            _ => None,
        })
        .collect();
    assert_eq!(lists.len(), 2, "a heading must close the open task list");
    assert_eq!(lists[0].len(), 2);
    assert_eq!(lists[1].len(), 1);
    assert_eq!(lists[0][1].status, TaskStatus::Complete);

    let out = convert(md);
    assert_eq!(out.matches("<ac:task-list>").count(), 2);
    assert_eq!(out.matches("</ac:task-list>").count(), 2);
}

#[test]
fn test_paragraph_and_bullet_also_close_task_list() {
    let md = "- [ ] a\nsome text\n- [ ] b\n- bullet\n- [ ] c";
    let out = convert(md);
    assert_eq!(out.matches("<ac:task-list>").count(), 3);
}

#[test]
fn test_task_ids_are_unique() {
    let out = convert("- [ ] a\n- [ ] b\n- [ ] c");
    let ids: Vec<&str> = out
        .split("<ac:task-id>")
        .skip(1)
        .filter_map(|s| s.split("</ac:task-id>").next())
        .collect();
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);
}

#[test]
fn test_due_tagging_is_idempotent() {
    let once = convert_due_date_to_time_tag("Ship — @bob — Due: 2025-11-01, recheck Due:2025-11-03");
    assert_eq!(
        once,
        r#"Ship — @bob — <time datetime="2025-11-01"></time>, recheck <time datetime="2025-11-03"></time>"#
    );
    assert_eq!(convert_due_date_to_time_tag(&once), once);
}

#[test]
fn test_tbd_and_malformed_dates_stay_untouched() {
    assert_eq!(
        convert_due_date_to_time_tag("Write docs — @TBD — Due: TBD"),
        "Write docs — @TBD — Due: TBD"
    );
    assert_eq!(
        convert_due_date_to_time_tag("Due: 2025/10/27"),
        "Due: 2025/10/27"
    );
}

#[test]
fn test_unknown_lines_never_fail() {
    let md = "####### weird\n* star bullet\n<b>raw</b>\n\n\n";
    let out = convert(md);
    assert_eq!(
        out,
        "<p>####### weird</p>\n<p>* star bullet</p>\n<p><b>raw</b></p>"
    );
    assert_eq!(convert(""), "");
}

#[test]
fn test_checkbox_counts_survive_conversion() {
    let md = "## Action items\n- [ ] a\n- [x] b\n- [ ] c\n## Other\n- [X] d";
    assert_eq!(extract_action_items_count(md), (2, 2));

    let out = convert(md);
    assert_eq!(out.matches("<ac:task-status>incomplete</ac:task-status>").count(), 2);
    assert_eq!(out.matches("<ac:task-status>complete</ac:task-status>").count(), 2);
}
