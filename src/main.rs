#[cfg(target_arch = "wasm32")]
fn main() {
    jathquiz::wasm::mount();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("jathquiz runs in the browser: build it for wasm32 with `trunk serve`.");
}
