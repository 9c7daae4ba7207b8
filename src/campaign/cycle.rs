use std::fmt;

use crate::campaign::config::Campaign;

/// One assimilation cycle, the unit a single job is submitted for.
///
/// Components render fixed-width (4/2/2/2 digits) everywhere they appear:
/// in the cycle id, in the data directory name and in the exported
/// environment variables.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cycle {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
}

impl Cycle {
    pub fn yyyy(&self) -> String {
        format!("{:04}", self.year)
    }

    pub fn mm(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn dd(&self) -> String {
        format!("{:02}", self.day)
    }

    pub fn hh(&self) -> String {
        format!("{:02}", self.hour)
    }

    /// Composite cycle id, e.g. `2024092706`
    pub fn id(&self) -> String {
        format!("{}{}{}{}", self.yyyy(), self.mm(), self.dd(), self.hh())
    }

    /// Date part keying the data directory, e.g. `20240927`
    pub fn date(&self) -> String {
        format!("{}{}{}", self.yyyy(), self.mm(), self.dd())
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl Campaign {
    /// Enumerate the full cross product years × months × days × hours,
    /// outermost axis first, in configuration order.
    ///
    /// Exactly one cycle per combination. No calendar filtering happens
    /// here: a nonexistent date fails inside its job, visible in the log,
    /// and never silently shrinks the sweep.
    pub fn cycles(&self) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        for &year in &self.years {
            for &month in &self.months {
                for &day in &self.days {
                    for &hour in &self.hours {
                        cycles.push(Cycle { year, month, day, hour });
                    }
                }
            }
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::analysis::AnalysisKind;
    use crate::campaign::config::Resources;

    use super::*;

    fn test_campaign() -> Campaign {
        Campaign {
            years: vec![2024],
            months: vec![9],
            days: vec![27],
            hours: vec![6],
            data_root: "/data/rrfs/na/prod".to_string(),
            scripts_dir: "/opt/jodiff/scripts".to_string(),
            analysis: AnalysisKind::ConventionalScalar,
            domain: "True".to_string(),
            save_detail: false,
            job_tag: "pygsi".to_string(),
            python: "python3".to_string(),
            sbatch: "sbatch".to_string(),
            modules: vec![],
            conda_env: None,
            resources: Resources {
                time: "01:00:00".to_string(),
                memory: "16G".to_string(),
                account: "wrfruc".to_string(),
                partition: "batch".to_string(),
            },
        }
    }

    #[test]
    fn test_fixed_width_components() {
        let cycle = Cycle { year: 2024, month: 9, day: 27, hour: 6 };
        assert_eq!(cycle.yyyy(), "2024");
        assert_eq!(cycle.mm(), "09");
        assert_eq!(cycle.dd(), "27");
        assert_eq!(cycle.hh(), "06");
        assert_eq!(cycle.id(), "2024092706");
        assert_eq!(cycle.date(), "20240927");
    }

    #[test]
    fn test_single_element_axes_yield_one_cycle() {
        let campaign = test_campaign();
        assert_eq!(campaign.cycles(), vec![Cycle { year: 2024, month: 9, day: 27, hour: 6 }]);
    }

    #[test]
    fn test_cross_product_covers_every_combination_once() {
        let mut campaign = test_campaign();
        campaign.years = vec![2023, 2024];
        campaign.days = vec![26, 27, 28];
        campaign.hours = (0..24).collect();

        let cycles = campaign.cycles();
        assert_eq!(cycles.len(), 2 * 1 * 3 * 24);

        let ids: HashSet<String> = cycles.iter().map(Cycle::id).collect();
        assert_eq!(ids.len(), cycles.len());
        assert!(ids.contains("2023092600"));
        assert!(ids.contains("2024092823"));
    }

    #[test]
    fn test_axes_enumerated_in_configuration_order() {
        let mut campaign = test_campaign();
        campaign.hours = vec![18, 0, 6];
        let hours: Vec<u8> = campaign.cycles().iter().map(|c| c.hour).collect();
        assert_eq!(hours, vec![18, 0, 6]);
    }
}
