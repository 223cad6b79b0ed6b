use rand::{rngs::StdRng, SeedableRng};
use stepwise_pathfinding::{Algorithm, RunConfig, RunController, DEFAULT_WALL_DENSITY};

// Runs a search on the 20x20 session grid and redraws it in the terminal after every step.
// The grid uses
// - S for the start
// - E for the end
// - # for walls
// - o for visited cells
// - * for the path
//
// Usage: cargo run --example terminal -- [astar|dijkstra|bfs] [speed]

fn main() {
    let mut args = std::env::args().skip(1);
    let algorithm = match args.next().map(|s| s.parse::<Algorithm>()) {
        Some(Ok(algorithm)) => algorithm,
        Some(Err(e)) => {
            eprintln!("{e}");
            return;
        }
        None => Algorithm::Astar,
    };
    let speed = args.next().and_then(|s| s.parse().ok()).unwrap_or(20.0);

    let mut controller = RunController::default().with_config(RunConfig::new(speed));
    controller.set_algorithm(algorithm);
    controller.randomize_walls(&mut StdRng::seed_from_u64(42), DEFAULT_WALL_DENSITY);

    // Clear the screen and move the cursor home before each frame.
    match controller.run(|grid| print!("\x1B[2J\x1B[H{}", grid)) {
        Ok(result) => match result.stats() {
            Some(stats) => println!("{}", stats),
            None => println!("No path found! Try removing some walls."),
        },
        Err(e) => eprintln!("{e}"),
    }
}
