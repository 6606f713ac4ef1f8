use crate::models::{Chapter, ContentNode};

pub(crate) fn format_duration(total_seconds: u64) -> String {
    format!("{} min {} sec", total_seconds / 60, total_seconds % 60)
}

/// Sum of the direct lesson children's durations.
///
/// Lessons inside sub-chapters are not counted, whether or not those
/// sub-chapters are loaded.
pub(crate) fn chapter_duration(chapter: &Chapter) -> u64 {
    chapter
        .children
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|n| n.as_lesson())
        .map(|l| l.duration_seconds)
        .fold(0u64, u64::saturating_add)
}

/// Either 0 or 100; not proportional to completed descendants.
pub(crate) fn chapter_progress(chapter: &Chapter) -> u8 {
    if chapter.is_completed {
        100
    } else {
        0
    }
}

/// Secondary line shown under a node's title.
pub(crate) fn node_subtitle(node: &ContentNode) -> String {
    match node {
        ContentNode::Lesson(l) => format!("{} · {}", l.media_type, format_duration(l.duration_seconds)),
        ContentNode::Chapter(c) if c.is_loaded() => format!(
            "{} · {}%",
            format_duration(chapter_duration(c)),
            chapter_progress(c)
        ),
        ContentNode::Chapter(_) => String::new(),
    }
}
