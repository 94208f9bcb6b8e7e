use crate::scanner::results::OpenPortRecord;

/// One fingerprint rule: the label applies when every port in
/// `all_open` is open and, if `any_open` is non-empty, at least one of
/// those is open too.
#[derive(Debug, Clone, Copy)]
pub struct OsSignature {
    pub label: &'static str,
    pub all_open: &'static [u16],
    pub any_open: &'static [u16],
}

impl OsSignature {
    fn matches(&self, record: &OpenPortRecord) -> bool {
        self.all_open.iter().all(|&p| record.is_open(p))
            && (self.any_open.is_empty() || self.any_open.iter().any(|&p| record.is_open(p)))
    }
}

/// Default ruleset. Order is part of the contract: rules are evaluated
/// top to bottom and the first match wins, so overlapping signatures
/// resolve deterministically.
pub const DEFAULT_SIGNATURES: &[OsSignature] = &[
    OsSignature {
        label: "Linux/Unix based",
        all_open: &[22, 80],
        any_open: &[],
    },
    OsSignature {
        label: "Windows",
        all_open: &[135, 445],
        any_open: &[],
    },
    OsSignature {
        label: "macOS",
        all_open: &[],
        any_open: &[548, 631],
    },
];

/// Best-effort OS guess from the open-port pattern; `None` means
/// undetermined. False positives and negatives are expected — this is a
/// coarse heuristic, not a fingerprint database.
pub fn guess_os(record: &OpenPortRecord) -> Option<&'static str> {
    guess_os_with(DEFAULT_SIGNATURES, record)
}

/// Same heuristic against a caller-supplied ruleset.
pub fn guess_os_with(rules: &[OsSignature], record: &OpenPortRecord) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| rule.matches(record))
        .map(|rule| rule.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(open: &[u16]) -> OpenPortRecord {
        let record = OpenPortRecord::sized_for(open);
        for &port in open {
            assert!(record.mark_open(port));
        }
        record
    }

    #[test]
    fn ssh_and_http_reads_as_linux() {
        let record = record_with(&[22, 80]);
        assert_eq!(guess_os(&record), Some("Linux/Unix based"));
    }

    #[test]
    fn rpc_and_smb_reads_as_windows() {
        let record = record_with(&[135, 445]);
        assert_eq!(guess_os(&record), Some("Windows"));
    }

    #[test]
    fn afp_or_ipp_alone_reads_as_macos() {
        assert_eq!(guess_os(&record_with(&[548])), Some("macOS"));
        assert_eq!(guess_os(&record_with(&[631])), Some("macOS"));
    }

    #[test]
    fn no_signature_match_is_undetermined() {
        assert_eq!(guess_os(&record_with(&[])), None);
        assert_eq!(guess_os(&record_with(&[443, 8080])), None);
    }

    #[test]
    fn first_matching_rule_wins_on_overlap() {
        // Satisfies both the Linux and the Windows signatures; rule
        // order decides.
        let record = record_with(&[22, 80, 135, 445]);
        assert_eq!(guess_os(&record), Some("Linux/Unix based"));
    }

    #[test]
    fn partial_all_open_does_not_match() {
        assert_eq!(guess_os(&record_with(&[22])), None);
        assert_eq!(guess_os(&record_with(&[135])), None);
    }

    #[test]
    fn custom_ruleset_is_honored() {
        const RULES: &[OsSignature] = &[OsSignature {
            label: "printer",
            all_open: &[9100],
            any_open: &[],
        }];
        let record = record_with(&[9100]);
        assert_eq!(guess_os_with(RULES, &record), Some("printer"));
        assert_eq!(guess_os(&record), None);
    }
}
