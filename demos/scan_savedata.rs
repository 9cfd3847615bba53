use std::env;
use std::path::PathBuf;

use savehall::Result;
use savehall::disc_map::DiscMap;
use savehall::library::scan_psp_saves;
use savehall::resolver::Resolver;

fn main() -> Result<()> {
    let mut args = env::args_os().skip(1).map(PathBuf::from);
    let savedata = args.next().unwrap_or_else(|| PathBuf::from("PSP/SAVEDATA"));
    let states = args.next();
    let discs = match args.next() {
        Some(map) => DiscMap::load(&map)?,
        None => DiscMap::new(),
    };

    let saves = scan_psp_saves(&savedata, states.as_deref(), &Resolver::new(), &discs);
    for save in &saves {
        println!(
            "{:<12} {:<40} {} state(s){}",
            save.key,
            save.title,
            save.save_states.len(),
            if save.disc.is_some() { ", disc found" } else { "" }
        );
    }
    println!("{}", serde_json::to_string_pretty(&saves)?);

    Ok(())
}
