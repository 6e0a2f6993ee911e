use clap::{arg,crate_version,ArgGroup,Command};
use fgkcompressor::fgk;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            return true;
        }
        return false;
    }
    true
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `fgkcompressor -c my_expanded my_compressed`
Expand:        `fgkcompressor -d my_compressed my_expanded`";

    let main_cmd = Command::new("fgkcompressor")
        .about("Compress and expand with one-pass adaptive Huffman coding")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(-c --compress "compress INPUT into OUTPUT"))
        .arg(arg!(-d --decompress "expand INPUT into OUTPUT"))
        .group(ArgGroup::new("mode").args(["compress","decompress"]).required(true))
        .arg(arg!(--strict "fail if the compressed stream is truncated or corrupt"))
        .arg(arg!(<INPUT> "input path"))
        .arg(arg!(<OUTPUT> "output path"));

    let matches = main_cmd.get_matches();
    let path_in = matches.get_one::<String>("INPUT").expect(RCH);
    let path_out = matches.get_one::<String>("OUTPUT").expect(RCH);
    let opt = fgk::Options {
        strict: matches.get_flag("strict")
    };
    if !ok_to_overwrite(path_out) {
        eprintln!("abort operation");
        return Ok(());
    }
    let mut in_file = std::fs::File::open(path_in)?;
    let mut out_file = std::fs::File::create(path_out)?;

    if matches.get_flag("compress") {
        let (in_size,out_size) = fgk::compress(&mut in_file,&mut out_file,&opt)?;
        eprintln!("compressed {} into {}",in_size,out_size);
    } else {
        let (in_size,out_size) = fgk::expand(&mut in_file,&mut out_file,&opt)?;
        eprintln!("expanded {} into {}",in_size,out_size);
    }

    Ok(())
}
