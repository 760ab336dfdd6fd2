use icegrid::config::Config;
use icegrid::date_gen::DateGenerator;

fn main() {
    let config = match Config::from_file("./data/config/config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return;
        }
    };

    let generator = DateGenerator::new(config.start_date(), config.end_date());
    let dates = generator.generate_date_series();
    println!(
        "{} dates from {} to {} ({})",
        dates.len(),
        config.start_date(),
        config.end_date(),
        config.hemisphere()
    );

    for window in generator.month_windows() {
        println!(
            "  {} .. {} ({} days)",
            window.start,
            window.end,
            window.dates().len()
        );
    }
}
