use icons::Loader;
use leptos::prelude::*;
use tw_merge::tw_merge;

/// Inline loading indicator for a tree level or a single chapter.
#[component]
pub fn Spinner(#[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("size-4 shrink-0 animate-spin text-muted-foreground", class);

    view! { <Loader class=merged_class attr:role="status" attr:aria-label="Loading content" /> }
}
