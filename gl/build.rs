use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

fn generate_gl(
    api: gl_generator::Api,
    version: gl_generator::Version,
    extensions: gl_generator::Extensions,
) -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=../gl-generator");
    println!("cargo:rerun-if-changed=../xml-iterator");

    let api_str = api.as_str();
    let out_dir = PathBuf::from(&env::var("OUT_DIR")?);

    let xml = String::from_utf8_lossy(khronos_api::GL_XML);
    let registry = gl_generator::filter_registry(
        gl_generator::parse_registry(&xml)?,
        &api,
        &version,
        extensions,
    )?;

    let mut types_out = BufWriter::new(File::create(
        out_dir.join(format!("{api_str}_types_generated.rs")),
    )?);
    for name in gl_generator::emit_types(&mut types_out, &registry)? {
        println!("cargo:warning=unknown type {name}, emitted as opaque pointer");
    }

    let mut enums_out = BufWriter::new(File::create(
        out_dir.join(format!("{api_str}_enums_generated.rs")),
    )?);
    gl_generator::emit_enums(&mut enums_out, &registry)?;

    let mut api_out = BufWriter::new(File::create(
        out_dir.join(format!("{api_str}_api_generated.rs")),
    )?);
    gl_generator::emit_api(&mut api_out, &registry, &api)?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let extensions = if env::var_os("CARGO_FEATURE_EXTENSIONS").is_some() {
        gl_generator::Extensions::All
    } else {
        gl_generator::Extensions::None
    };
    generate_gl(gl_generator::Api::Gl, gl_generator::Version(4, 6), extensions)?;

    Ok(())
}
