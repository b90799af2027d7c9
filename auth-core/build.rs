use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = PathBuf::from("../proto");

    println!("cargo:rerun-if-changed=../proto/auth/v1/");

    // Client for the CLI; the server stubs back the in-process test cluster.
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["../proto/auth/v1/auth.proto"], &[&proto_root])?;

    Ok(())
}
