use crate::skiplist::MAX_LEVEL;

/// Heights calculates minimum, maximum, average and per-level population
/// of node heights in a [`Skiplist`](crate::Skiplist). With a healthy
/// level generator the population shrinks by roughly `1/P` per level.
#[derive(Clone, Debug)]
pub struct Heights {
    samples: usize,
    min: usize,
    max: usize,
    total: usize,
    heights: [u64; MAX_LEVEL + 1],
}

impl Heights {
    pub(crate) fn new() -> Heights {
        Default::default()
    }

    pub(crate) fn sample(&mut self, height: usize) {
        self.samples += 1;
        self.total += height;
        if self.min == 0 || height < self.min {
            self.min = height
        }
        if height > self.max {
            self.max = height
        }
        self.heights[height] += 1;
    }

    /// Return number of nodes sampled.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Return height of the shortest node.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Return height of the tallest node.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Return the average node height, zero when nothing was sampled.
    pub fn mean(&self) -> usize {
        if self.samples == 0 {
            0
        } else {
            self.total / self.samples
        }
    }

    /// Return number of nodes that are exactly `height` levels tall.
    pub fn count(&self, height: usize) -> u64 {
        self.heights.get(height).cloned().unwrap_or(0)
    }

    /// Return number of nodes participating in `level`, that is nodes
    /// whose height is at least `level`.
    pub fn population(&self, level: usize) -> u64 {
        self.heights.iter().skip(level).sum()
    }

    /// Return (height, count) pairs for every height that has nodes.
    pub fn histogram(&self) -> Vec<(usize, u64)> {
        self.heights
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0)
            .map(|(h, &n)| (h, n))
            .collect()
    }

    /// Pretty print height statistics in human readable format, useful in logs.
    pub fn pretty_print(&self, prefix: &str) {
        println!(
            "{}height (min, avg, max): {:?}",
            prefix,
            (self.min, self.mean(), self.max)
        );
        for (height, n) in self.histogram().into_iter() {
            println!("{}  height {:2} = {}", prefix, height, n);
        }
    }

    /// Convert height statistics to JSON format, useful for plotting.
    pub fn json(&self) -> String {
        let hs: Vec<String> = self
            .histogram()
            .into_iter()
            .map(|(h, n)| format!("\"{}\": {}", h, n))
            .collect();
        let strs = [
            format!("\"min\": {}", self.min),
            format!("\"mean\": {}", self.mean()),
            format!("\"max\": {}", self.max),
            format!("\"heights\": {{ {} }}", hs.join(", ")),
        ];
        ("{ ".to_string() + strs.join(", ").as_str() + " }").to_string()
    }
}

impl Default for Heights {
    fn default() -> Self {
        Heights {
            samples: 0,
            min: 0,
            max: 0,
            total: 0,
            heights: [0; MAX_LEVEL + 1],
        }
    }
}
