use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm", "[&_p]:leading-relaxed"}
    clx! {AlertDescription, div, "text-sm"}
}

pub use components::*;
