mod fitness;
mod genetic;
mod machine;
mod records;
mod search;

use serde::{Deserialize, Serialize};
use std::env;
use std::process;

use genetic::MutationRates;
use records::{HallOfFame, HallOfFameEntry, StatsLog};
use search::{Search, SearchParams};

/// Driver configuration (can be loaded from YAML).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchSettings,
    pub sweep: SweepSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Members kept after each generation's cull.
    pub population_size: usize,
    /// New members bred each generation.
    pub offspring_per_generation: usize,
    /// Generations before a trial gives up.
    pub max_generations: usize,
    /// Machine-step bound per evaluation.
    pub max_steps_per_eval: usize,
    /// Per-position mutation probabilities.
    pub mutation: MutationRates,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// First target length to attempt.
    pub start_len: usize,
    /// Stop after this length even if still solving (0 = sweep until a
    /// length goes unsolved).
    pub max_len: usize,
    /// Independent trials per target length.
    pub trials: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub hof_path: String,
    pub stats_path: String,
    /// Print every fitness improvement, not just per-trial summaries.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            sweep: SweepSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            population_size: 100,
            offspring_per_generation: 100,
            max_generations: 10_000,
            max_steps_per_eval: 100,
            mutation: MutationRates::default(),
            seed: 42,
        }
    }
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            start_len: 1,
            max_len: 0,
            trials: 10,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            hof_path: "hof.txt".to_string(),
            stats_path: "stats.txt".to_string(),
            verbose: true,
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn from_yaml(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a YAML file
    pub fn to_yaml(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

fn print_usage() {
    println!("evotape - evolve tape programs toward counting targets");
    println!();
    println!("Usage: evotape [OPTIONS]");
    println!("  --config, -c <file>      Load settings from a YAML file");
    println!("  --generate-config [file] Write a config template and exit");
    println!("  --population, -p <n>     Population size after each cull");
    println!("  --offspring <n>          Offspring bred per generation");
    println!("  --generations, -g <n>    Generation budget per trial");
    println!("  --steps <n>              Machine-step bound per evaluation");
    println!("  --trials, -t <n>         Trials per target length");
    println!("  --start-len <n>          First target length");
    println!("  --max-len <n>            Last target length (0 = unbounded)");
    println!("  --seed, -s <n>           Run seed");
    println!("  --hof <file>             Hall-of-fame path");
    println!("  --stats <file>           Stats path");
    println!("  --replay <program>       Run one program and exit");
    println!("  --quiet, -q              Only per-trial summaries");
}

fn parse_args() -> Config {
    let argv: Vec<String> = env::args().collect();
    let mut config = Config::default();

    // First pass: check for --config or --generate-config.
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let config_path = &argv[i];
                match Config::from_yaml(config_path) {
                    Ok(loaded) => {
                        println!("Loaded config from: {}", config_path);
                        config = loaded;
                    }
                    Err(e) => {
                        eprintln!("Error loading config file '{}': {}", config_path, e);
                        process::exit(1);
                    }
                }
            }
            "--generate-config" => {
                i += 1;
                let output_path = if i < argv.len() && !argv[i].starts_with('-') {
                    argv[i].clone()
                } else {
                    "config.yaml".to_string()
                };
                match Config::default().to_yaml(&output_path) {
                    Ok(_) => {
                        println!("Generated config template: {}", output_path);
                        process::exit(0);
                    }
                    Err(e) => {
                        eprintln!("Error writing config template: {}", e);
                        process::exit(1);
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    // Second pass: CLI args override config file values.
    i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" | "-c" => {
                i += 1; // skip, already processed
            }
            "--population" | "-p" => {
                i += 1;
                config.search.population_size = argv[i].parse().expect("Invalid population");
            }
            "--offspring" => {
                i += 1;
                config.search.offspring_per_generation =
                    argv[i].parse().expect("Invalid offspring");
            }
            "--generations" | "-g" => {
                i += 1;
                config.search.max_generations = argv[i].parse().expect("Invalid generations");
            }
            "--steps" => {
                i += 1;
                config.search.max_steps_per_eval = argv[i].parse().expect("Invalid steps");
            }
            "--trials" | "-t" => {
                i += 1;
                config.sweep.trials = argv[i].parse().expect("Invalid trials");
            }
            "--start-len" => {
                i += 1;
                config.sweep.start_len = argv[i].parse().expect("Invalid start-len");
            }
            "--max-len" => {
                i += 1;
                config.sweep.max_len = argv[i].parse().expect("Invalid max-len");
            }
            "--seed" | "-s" => {
                i += 1;
                config.search.seed = argv[i].parse().expect("Invalid seed");
            }
            "--hof" => {
                i += 1;
                config.output.hof_path = argv[i].clone();
            }
            "--stats" => {
                i += 1;
                config.output.stats_path = argv[i].clone();
            }
            "--replay" => {
                i += 1;
                replay(&argv[i], &config);
                process::exit(0);
            }
            "--quiet" | "-q" => {
                config.output.verbose = false;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    config
}

/// Run one program under the configured step bound and print what it does.
fn replay(text: &str, config: &Config) {
    let program = match machine::parse_program(text) {
        Some(program) => program,
        None => {
            eprintln!("Cannot parse program '{}': symbols are ><-+[].,E", text);
            process::exit(1);
        }
    };
    let result = fitness::evaluate(&program, config.search.max_steps_per_eval, config.search.seed);
    println!("code:   {}", machine::program_text(&program));
    println!("steps:  {}", result.steps);
    match result.output {
        Some(output) => println!("output: {}", join_bytes(&output)),
        None => println!("output: (did not halt within {} steps)", config.search.max_steps_per_eval),
    }
}

fn join_bytes(values: &[u8]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

fn fmt_fitness(value: u64) -> String {
    if value == fitness::WORST {
        "inf".to_string()
    } else {
        value.to_string()
    }
}

fn main() {
    let config = parse_args();
    let trials = config.sweep.trials.max(1);

    println!("evotape target sweep");
    println!("====================\n");
    println!("Configuration:");
    println!(
        "  Population: {} (+{} offspring per generation)",
        config.search.population_size, config.search.offspring_per_generation
    );
    println!("  Generations per trial: {}", config.search.max_generations);
    println!("  Step bound per evaluation: {}", config.search.max_steps_per_eval);
    println!(
        "  Mutation rates: delete {:.2} / insert {:.2} / substitute {:.2}",
        config.search.mutation.delete,
        config.search.mutation.insert,
        config.search.mutation.substitute
    );
    println!("  Trials per target length: {}", trials);
    if config.sweep.max_len > 0 {
        println!(
            "  Target lengths: {}..={}",
            config.sweep.start_len.max(1),
            config.sweep.max_len
        );
    } else {
        println!(
            "  Target lengths: {}.. (until one goes unsolved)",
            config.sweep.start_len.max(1)
        );
    }
    println!("  Seed: {}", config.search.seed);
    println!();

    let mut hof = match HallOfFame::create(&config.output.hof_path) {
        Ok(hof) => hof,
        Err(e) => {
            eprintln!("Cannot create '{}': {}", config.output.hof_path, e);
            process::exit(1);
        }
    };
    let mut stats = match StatsLog::create(&config.output.stats_path) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Cannot create '{}': {}", config.output.stats_path, e);
            process::exit(1);
        }
    };

    let mut recap: Vec<(usize, f64)> = Vec::new();
    let mut target_len = config.sweep.start_len.max(1);

    loop {
        if config.sweep.max_len > 0 && target_len > config.sweep.max_len {
            break;
        }
        let target: Vec<u8> = (0..target_len).map(|v| (v % 256) as u8).collect();
        println!("=== target length {}: {} ===", target_len, join_bytes(&target));

        let mut trial_steps: Vec<u64> = Vec::new();
        let mut all_solved = true;

        for trial in 0..trials {
            let trial_seed = search::split_mix_64(
                config.search.seed
                    ^ search::split_mix_64((target_len as u64) << 20 | trial as u64),
            );
            let params = SearchParams {
                population_size: config.search.population_size,
                offspring_per_generation: config.search.offspring_per_generation,
                max_generations: config.search.max_generations,
                max_steps_per_eval: config.search.max_steps_per_eval,
                rates: config.search.mutation,
                seed: trial_seed,
            };
            let mut searcher = Search::new(target.clone(), params);

            let verbose = config.output.verbose;
            let max_steps = config.search.max_steps_per_eval;
            let outcome = searcher.run(|search, state| {
                if verbose && state.improved {
                    // Re-run the best member once so the improvement line
                    // can show what it actually printed.
                    let shown =
                        fitness::evaluate(search.best_program(), max_steps, state.generation as u64);
                    println!(
                        "  trial {:2} | gen {:6} | fitness {:>8} | len {:4} | code {}",
                        trial,
                        state.generation,
                        fmt_fitness(state.best_fitness),
                        state.best_len,
                        machine::program_text(search.best_program()),
                    );
                    if let Some(output) = shown.output {
                        println!("           output: {}", join_bytes(&output));
                    }
                }
                false
            });

            if outcome.solved {
                let program = machine::program_text(&outcome.best);
                println!(
                    "  trial {:2} solved in {} generations, {} machine steps | code {}",
                    trial, outcome.generations, outcome.steps_total, program
                );
                let entry = HallOfFameEntry {
                    target_len,
                    trial,
                    steps: outcome.steps_total,
                    program,
                };
                if let Err(e) = hof.record(&entry) {
                    eprintln!("Failed to write hall of fame: {}", e);
                    process::exit(1);
                }
            } else {
                println!(
                    "  trial {:2} gave up after {} generations (best fitness {})",
                    trial,
                    outcome.generations,
                    fmt_fitness(outcome.best_fitness)
                );
                all_solved = false;
            }
            trial_steps.push(outcome.steps_total);

            if !all_solved {
                break;
            }
        }

        let avg = trial_steps.iter().sum::<u64>() as f64 / trial_steps.len() as f64;
        if let Err(e) = stats.record(target_len, avg) {
            eprintln!("Failed to write stats: {}", e);
            process::exit(1);
        }
        recap.push((target_len, avg));
        println!(
            "  length {}: average {:.0} machine steps over {} trials\n",
            target_len,
            avg,
            trial_steps.len()
        );

        if !all_solved {
            println!("Stopping sweep: target length {} went unsolved", target_len);
            break;
        }
        target_len += 1;
    }

    println!("\nSweep recap:");
    for (len, avg) in &recap {
        println!("  length {:4}: {:12.0} steps on average", len, avg);
    }
    println!("\nHall of fame: {}", config.output.hof_path);
    println!("Stats:        {}", config.output.stats_path);
}
