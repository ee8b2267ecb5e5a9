//! Generate `include/wirehttp.h` from the `extern "C"` surface.
//!
//! A cbindgen failure only warns, so the library still builds when the
//! header cannot be regenerated.

use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    let header = crate_dir.join("include").join("wirehttp.h");

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("WIREHTTP_H")
        .with_documentation(true)
        .generate();

    match generated {
        Ok(bindings) => {
            std::fs::create_dir_all(header.parent().unwrap()).unwrap();
            bindings.write_to_file(&header);
        }
        Err(e) => println!("cargo:warning=cbindgen could not generate {}: {e}", header.display()),
    }
}
