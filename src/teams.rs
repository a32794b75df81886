use std::collections::HashSet;

pub const DEFAULT_TEAMS: [&str; 13] = [
    "Olympiacos",
    "PAOK",
    "AEK Athens",
    "Panathinaikos",
    "Aris",
    "OFI",
    "Asteras Tripolis",
    "Volos",
    "Atromitos",
    "Panetolikos",
    "Lamia",
    "PAS Giannina",
    "Panserraikos",
];

/// Ordered list of the teams we query for, doubling as the membership filter for fetched events.
#[derive(Debug, Clone)]
pub struct TeamRegistry {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl TeamRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();
        for name in names {
            let name: String = name.into();
            if lookup.insert(name.clone()) {
                ordered.push(name);
            }
        }
        TeamRegistry { names: ordered, lookup }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl Default for TeamRegistry {
    fn default() -> Self {
        TeamRegistry::new(DEFAULT_TEAMS)
    }
}
