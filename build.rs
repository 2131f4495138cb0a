// Stages static/ (page, styles and the wasm-pack output in static/pkg) into dist/.
use std::path::Path;

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    let out_dir = Path::new("dist");
    let static_dir = Path::new("static");
    if !static_dir.exists() {
        println!("cargo:warning=static/ missing, dist/ not staged");
        return;
    }

    if out_dir.exists() {
        if let Err(err) = fs_extra::remove_items(&[out_dir]) {
            println!("cargo:warning=could not clear dist/: {err}");
        }
    }
    if let Err(err) = std::fs::create_dir_all(out_dir) {
        println!("cargo:warning=could not create dist/: {err}");
        return;
    }

    let options = CopyOptions::new().content_only(true).overwrite(true);
    if let Err(err) = copy(static_dir, out_dir, &options) {
        println!("cargo:warning=copying static/ to dist/ failed: {err}");
    }
}
