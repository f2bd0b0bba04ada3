use std::env;
use std::io::{BufWriter, stdout};

use anyhow::Context as _;

// prints generated bindings to stdout, handy for reading what build.rs produces.
//
// usage: cargo run -p gl-generator --example gl-generator -- [major.minor] [core]

fn main() -> anyhow::Result<()> {
    let version: gl_generator::Version = env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("4.6")
        .parse()
        .context("invalid version")?;
    let extensions = match env::args().nth(2).as_deref() {
        Some("core") => gl_generator::Extensions::None,
        _ => gl_generator::Extensions::All,
    };

    let xml = String::from_utf8_lossy(khronos_api::GL_XML);
    let api = gl_generator::Api::Gl;
    let registry = gl_generator::filter_registry(
        gl_generator::parse_registry(&xml)?,
        &api,
        &version,
        extensions,
    )?;

    let mut w = BufWriter::new(stdout());
    let unknown = gl_generator::emit_types(&mut w, &registry)?;
    for name in unknown {
        eprintln!("unknown type {name}, emitted as opaque pointer");
    }
    gl_generator::emit_enums(&mut w, &registry)?;
    gl_generator::emit_api(&mut w, &registry, &api)?;

    Ok(())
}
