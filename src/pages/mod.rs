use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Spinner,
};
use crate::models::{ContentNode, FilterCriteria, NodeRef};
use crate::state::content_sync::ContentSyncController;
use crate::state::explorer::LoadState;
use crate::state::AppContext;
use crate::tree::display::node_subtitle;
use leptos::prelude::*;
use std::collections::HashSet;

/// Tabs shown above the explorer: `(tab id, label)`.
pub(crate) const TABS: &[(&str, &str)] = &[("courses", "Courses"), ("documents", "Documents")];

#[component]
pub fn ExplorerPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = ContentSyncController::new(&app_state);
    provide_context(sync);

    // View-local: which chapters are open. Closing never fetches.
    let open: RwSignal<HashSet<String>> = RwSignal::new(HashSet::new());
    provide_context(open);

    let filter_by: RwSignal<String> = RwSignal::new(String::new());
    let query_text: RwSignal<String> = RwSignal::new(String::new());

    let active_tab = move || {
        sync.state
            .with(|s| s.nav().tab_id().map(str::to_string))
            .unwrap_or_default()
    };

    let select_tab = move |tab_id: &str| {
        open.set(HashSet::new());
        sync.select_tab(tab_id);

        // Restore the tab's remembered filter into the form.
        let f = sync.state.with_untracked(|s| s.nav().filter().clone());
        filter_by.set(f.filter_by);
        query_text.set(f.query_text);
    };

    if let Some((first, _)) = TABS.first() {
        select_tab(first);
    }

    let on_filter_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        open.set(HashSet::new());
        sync.set_filter(FilterCriteria::new(
            filter_by.get_untracked().trim(),
            query_text.get_untracked().trim(),
        ));
    };

    let root_state = move || sync.state.with(|s| s.load_state(None));
    let roots = move || sync.state.with(|s| s.tree().roots().to_vec());
    let tree_is_empty = move || sync.state.with(|s| s.tree().is_empty());

    view! {
        <div class="mx-auto flex w-full max-w-3xl flex-col gap-4 px-4 py-6">
            <div class="flex items-center gap-1 border-b pb-2">
                {TABS
                    .iter()
                    .map(|(id, label)| {
                        let id = *id;
                        let tab_class = move || {
                            if active_tab() == id {
                                "rounded-md px-3 py-1 text-sm font-medium bg-accent text-accent-foreground"
                            } else {
                                "rounded-md px-3 py-1 text-sm text-muted-foreground hover:bg-accent/50"
                            }
                        };
                        view! {
                            <button type="button" class=tab_class on:click=move |_| select_tab(id)>
                                {*label}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>

            <div class="flex items-center gap-2">
                <form class="flex flex-1 items-center gap-2" on:submit=on_filter_submit>
                    <Input class="w-40" placeholder="Filter by" bind_value=filter_by />
                    <Input placeholder="Search content" bind_value=query_text />
                    <Button size=ButtonSize::Sm>"Apply"</Button>
                </form>
                <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| sync.refresh()>
                    "Refresh"
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    on:click=move |_| {
                        open.set(HashSet::new());
                        sync.reset();
                    }
                >
                    "Clear"
                </Button>
            </div>

            <Show when=move || sync.unauthorized.get()>
                <Alert class="border-destructive/30">
                    <AlertDescription class="text-destructive text-xs">
                        "Your session has expired. Sign in again to load content."
                    </AlertDescription>
                </Alert>
            </Show>

            <Show when=move || sync.last_error.with(Option::is_some) && !sync.unauthorized.get()>
                <div class="text-xs text-muted-foreground">
                    "Last request failed: " {move || sync.last_error.get().unwrap_or_default()}
                </div>
            </Show>

            {move || match root_state() {
                LoadState::Loading if tree_is_empty() => {
                    view! {
                        <div class="flex items-center gap-2 text-xs text-muted-foreground">
                            <Spinner />
                            "Loading content..."
                        </div>
                    }
                    .into_any()
                }
                LoadState::Failed(msg) => {
                    view! {
                        <Alert class="border-destructive/30">
                            <AlertDescription class="flex items-center justify-between gap-2 text-xs">
                                <span class="text-destructive">"Could not load this section: " {msg}</span>
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    on:click=move |_| sync.retry(None)
                                >
                                    "Retry"
                                </Button>
                            </AlertDescription>
                        </Alert>
                    }
                    .into_any()
                }
                LoadState::Loaded if tree_is_empty() => {
                    view! { <div class="text-xs text-muted-foreground">"Nothing here yet."</div> }
                        .into_any()
                }
                _ => view! { <NodeList nodes=roots() depth=0 /> }.into_any(),
            }}
        </div>
    }
}

#[component]
fn NodeList(nodes: Vec<NodeRef>, depth: usize) -> impl IntoView {
    view! {
        <ul class="flex flex-col">
            {nodes
                .into_iter()
                .map(|node| view! { <NodeRow node=node depth=depth /> })
                .collect_view()}
        </ul>
    }
}

#[component]
fn NodeRow(node: NodeRef, depth: usize) -> impl IntoView {
    let indent = format!("padding-left: {}rem", depth as f32 * 1.25);
    let subtitle = node_subtitle(&node);
    let pinned = node.is_pinned();
    let priority = node.priority().get();

    match node.as_ref() {
        ContentNode::Lesson(lesson) => {
            let title_class = if lesson.is_completed {
                "text-muted-foreground line-through"
            } else {
                ""
            };
            view! {
                <li class="flex items-center gap-2 py-1 text-sm" style=indent data-priority=priority>
                    <Show when=move || pinned>
                        <span class="text-xs" title="Pinned">"📌"</span>
                    </Show>
                    <a href=lesson.url.clone() target="_blank" class=title_class>
                        {lesson.title.clone()}
                    </a>
                    <span class="text-xs text-muted-foreground">{subtitle}</span>
                </li>
            }
            .into_any()
        }
        ContentNode::Chapter(chapter) => view! {
            <ChapterRow
                id=chapter.id.clone()
                name=chapter.name.clone()
                subtitle=subtitle
                loaded_children=chapter.children.clone()
                pinned=pinned
                priority=priority
                indent=indent
                depth=depth
            />
        }
        .into_any(),
    }
}

#[component]
fn ChapterRow(
    id: String,
    name: String,
    subtitle: String,
    loaded_children: Option<Vec<NodeRef>>,
    pinned: bool,
    priority: u8,
    indent: String,
    depth: usize,
) -> impl IntoView {
    let sync = expect_context::<ContentSyncController>();
    let open = expect_context::<RwSignal<HashSet<String>>>();

    // Everything below only needs the id by value.
    let id = StoredValue::new(id);
    let loaded_children = StoredValue::new(loaded_children);

    let is_open = move || id.with_value(|id| open.with(|o| o.contains(id)));
    let load_state = move || id.with_value(|id| sync.state.with(|s| s.load_state(Some(id))));

    let toggle = move |_| {
        let id = id.get_value();
        let was_open = open.with_untracked(|o| o.contains(&id));
        open.update(|o| {
            if was_open {
                o.remove(&id);
            } else {
                o.insert(id.clone());
            }
        });
        // Every expansion refetches; results merge on top of what is already loaded.
        if !was_open {
            sync.expand(&id);
        }
    };

    view! {
        <li class="flex flex-col" data-priority=priority>
            <div class="flex items-center gap-2 py-1 text-sm font-medium" style=indent>
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon class="h-6 w-6" on:click=toggle>
                    {move || if is_open() { "▾" } else { "▸" }}
                </Button>
                <Show when=move || pinned>
                    <span class="text-xs" title="Pinned">"📌"</span>
                </Show>
                <span>{name}</span>
                <span class="text-xs text-muted-foreground">{subtitle}</span>
                <Show when=move || load_state() == LoadState::Loading>
                    <Spinner class="size-3" />
                </Show>
            </div>

            <Show when=is_open>
                {move || match load_state() {
                    LoadState::Failed(msg) => view! {
                        <div class="flex items-center gap-2 py-1 text-xs text-destructive">
                            "Could not load this section: " {msg}
                            <Button
                                variant=ButtonVariant::Link
                                size=ButtonSize::Sm
                                on:click=move |_| id.with_value(|id| sync.retry(Some(id)))
                            >
                                "Retry"
                            </Button>
                        </div>
                    }
                    .into_any(),
                    _ => match loaded_children.get_value() {
                        Some(c) if !c.is_empty() => {
                            view! { <NodeList nodes=c depth=depth + 1 /> }.into_any()
                        }
                        Some(_) => view! {
                            <div class="py-1 text-xs text-muted-foreground">"Empty chapter"</div>
                        }
                        .into_any(),
                        None => ().into_any(),
                    },
                }}
            </Show>
        </li>
    }
}
