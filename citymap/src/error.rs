use std::fmt;

/// The two conditions a caller must distinguish and react to: both are
/// expected to occur occasionally and call for a retry with different
/// inputs, not a hard failure of the whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityMapError {
    /// The randomized fill or the dead-loop check never converged
    /// within the restart budget.
    LayoutInfeasible,
    /// Dijkstra left the target vertex at infinite distance after the
    /// caller's retry budget for picking a different goal was spent.
    RouteUnreachable,
}

impl fmt::Display for CityMapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CityMapError::LayoutInfeasible => {
                write!(f, "layout generation did not converge within the restart budget")
            }
            CityMapError::RouteUnreachable => {
                write!(f, "no path exists between the requested entry and exit")
            }
        }
    }
}

impl std::error::Error for CityMapError {}
