use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub rounds: usize,
    pub rounds_with_cuts: usize,
    pub pairs_checked: usize,
    pub two_edge_cuts: usize,
    pub rectangle_cuts: usize,
    pub cuts_registered: usize,
    pub duplicate_cuts: usize,
    pub time_us: usize,
}

impl Stats {
    pub fn print(&self) {
        info!(
            "Rounds {:?} (with cuts {:?}) Time(microseconds) {:?} Agent pairs checked: {:?} Two-edge cuts: {:?} Rectangle cuts: {:?} Registered: {:?} Duplicates: {:?}",
            self.rounds,
            self.rounds_with_cuts,
            self.time_us,
            self.pairs_checked,
            self.two_edge_cuts,
            self.rectangle_cuts,
            self.cuts_registered,
            self.duplicate_cuts
        );
    }
}
