//! Print the directory tree of a VDF archive
//!
//! ```text
//! cargo run -p vdfs-archive --example vdf_tree -- Anims.vdf
//! RUST_LOG=debug cargo run -p vdfs-archive --example vdf_tree -- Anims.vdf
//! ```

use vdfs_archive::{ArchiveConfig, VdfArchive};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: vdf_tree <archive.vdf>");
        std::process::exit(2);
    };

    let archive = VdfArchive::open(&path, ArchiveConfig::default())?;
    let header = archive.header();

    println!("{} ({})", archive.name(), archive.game_version());
    if !header.comment.is_empty() {
        println!("{}", header.comment);
    }
    println!(
        "{} files, {} nodes, {} content bytes\n",
        archive.file_count(),
        archive.node_count(),
        header.content_size
    );
    print!("{}", archive.render_tree());

    Ok(())
}
