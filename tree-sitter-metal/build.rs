fn main() {
    let src_dir = std::path::Path::new("src");

    let mut config = cc::Build::new();
    config.include(src_dir).std("c11");
    config
        .flag_if_supported("-Wno-unused-parameter")
        .flag_if_supported("-Wno-unused-value")
        .flag_if_supported("-Wno-trigraphs");

    let language_path = src_dir.join("metal.c");
    config.file(&language_path);

    println!("cargo:rerun-if-changed={}", language_path.display());
    println!("cargo:rerun-if-changed={}", src_dir.join("tree_sitter/parser.h").display());

    config.compile("tree-sitter-metal");
}
