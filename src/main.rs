//! Natural Selection CLI - Run an evolution from JSON configuration.

use std::sync::Arc;
use std::time::Instant;

use natural_selection::{
    evolution::{GenerationStats, Population, Progress},
    schema::EvolutionConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [--json]", args[0]);
        eprintln!();
        eprintln!("Evolve a population as described by a JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  --json       Print the full history as JSON when done");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let emit_json = args.iter().skip(2).any(|a| a == "--json");

    let config = EvolutionConfig::from_file(&args[1]).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    let space = config.gene_space().unwrap_or_else(|e| {
        eprintln!("Error building gene space: {}", e);
        std::process::exit(1);
    });
    let params = config.evolve_params();

    println!("Natural Selection");
    println!("=================");
    println!("Genes: {}", space.names().collect::<Vec<_>>().join(", "));
    println!("Population: {}", config.population.size);
    println!(
        "Generations: {} (breeding {:.2}, mutation {:.2})",
        params.generations, params.breeding_fraction, params.mutation_fraction
    );
    println!(
        "Evaluation: {}",
        if params.parallel {
            "parallel"
        } else {
            "sequential"
        }
    );
    println!();

    let mut builder = Population::builder(Arc::new(space), config.objective.clone())
        .size(config.population.size)
        .progress(Box::new(|progress: &Progress| {
            if let Progress::GenerationComplete {
                generation,
                total,
                best_fitness,
            } = progress
            {
                println!("  Generation {generation}/{total}: best so far {best_fitness:.6}");
            }
        }));
    if let Some(seed) = config.random_seed {
        builder = builder.random_seed(seed);
    }
    if let Some(genome) = config.population.initial_genome.clone() {
        builder = builder.initial_genome(genome);
    }

    let mut population = builder.build().unwrap_or_else(|e| {
        eprintln!("Error creating population: {}", e);
        std::process::exit(1);
    });

    println!("Evolving...");
    let start = Instant::now();
    let history = population.evolve(&params).unwrap_or_else(|e| {
        eprintln!("Evolution failed: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!();
    println!("Fitness by generation:");
    for (i, stats) in history.generation_stats().iter().enumerate() {
        if let Some(GenerationStats {
            mean,
            std: std_dev,
            min,
            max,
        }) = stats
        {
            println!(
                "  {:>4}: mean={:.6} std={:.6} min={:.6} max={:.6}",
                i, mean, std_dev, min, max
            );
        }
    }

    println!();
    match history.fittest() {
        Some(best) => {
            println!("Fittest genome across all generations:");
            println!("  Genome: {}", best.genome);
            println!("  Fitness: {:.6}", best.fitness);
            println!("  Generation: {}", best.generation);
        }
        None => println!("No generations were evaluated."),
    }
    println!("Time: {:.2}s", elapsed.as_secs_f32());

    if emit_json {
        match serde_json::to_string_pretty(&history) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing history: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
