//! Progress events emitted while a population is built and evolved.

/// Observable step of the evolution loop.
///
/// Events are informational only. Counts are 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Organisms of generation 0 created so far.
    Created { completed: usize, total: usize },
    /// Fitness evaluations finished in the current generation.
    Evaluated { completed: usize, total: usize },
    /// Breeders drawn in the current generation.
    Selected { completed: usize, total: usize },
    /// A generation has been evaluated, recorded and replaced.
    GenerationComplete {
        generation: usize,
        total: usize,
        best_fitness: f64,
    },
}

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;
