use crate::config::generate::generate_starter_config;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    let home_dir = dirs::home_dir().ok_or("could not determine home directory")?;
    let config_path = home_dir.join(".config/logsocket/config.yml");
    write_config(&config_content, config_path)
}

fn write_config(config_content: &str, config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() {
        print!(
            "Config file already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, config_content)?;
    println!("Config written to {}", config_path.display());

    Ok(())
}
