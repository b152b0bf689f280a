use std::collections::HashMap;

use unicorn_core::config::Config;
use unicorn_core::session::FfmpegRewriter;

pub fn run(config: &Config, env: Vec<(String, String)>, args: Vec<String>) -> anyhow::Result<()> {
    let rewriter = FfmpegRewriter::from_config(config);
    let env: HashMap<String, String> = env.into_iter().collect();

    let parsed = rewriter.parse(&args, env)?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);

    Ok(())
}
