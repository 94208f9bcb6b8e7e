/// Human-readable protocol name for a well-known port.
///
/// Pure, static lookup; `None` means the port has no entry and is
/// reported as "Unknown". Total over the whole u16 range — it never
/// fails.
pub fn service_name(port: u16) -> Option<&'static str> {
    let name = match port {
        20 => "FTP (Data Transfer)",
        21 => "FTP (Control)",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        67 => "DHCP (Server)",
        68 => "DHCP (Client)",
        69 => "TFTP",
        80 => "HTTP",
        110 => "POP3",
        119 => "NNTP",
        123 => "NTP",
        135 => "Microsoft RPC",
        137 => "NetBIOS Name Service",
        138 => "NetBIOS Datagram Service",
        139 => "NetBIOS Session Service",
        143 => "IMAP",
        161 => "SNMP",
        162 => "SNMP Trap",
        179 => "BGP",
        201 => "AppleTalk Routing Maintenance",
        389 => "LDAP",
        443 => "HTTPS",
        445 => "Microsoft SMB",
        465 => "SMTPS",
        514 => "Syslog",
        515 => "LPD",
        543 => "Kerberos",
        548 => "AFP (Apple Filing Protocol)",
        587 => "SMTP (Mail Submission)",
        993 => "IMAPS",
        995 => "POP3S",
        1025 => "Microsoft RPC",
        1723 => "PPTP",
        2049 => "NFS",
        3306 => "MySQL",
        3389 => "RDP",
        5060 => "SIP",
        5900 => "VNC",
        6000 => "X11",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_ports_resolve() {
        assert_eq!(service_name(22), Some("SSH"));
        assert_eq!(service_name(80), Some("HTTP"));
        assert_eq!(service_name(443), Some("HTTPS"));
        assert_eq!(service_name(445), Some("Microsoft SMB"));
        assert_eq!(service_name(3389), Some("RDP"));
    }

    #[test]
    fn unmapped_ports_are_unknown() {
        assert_eq!(service_name(0), None);
        assert_eq!(service_name(4444), None);
        assert_eq!(service_name(65535), None);
    }

    #[test]
    fn lookup_is_total_over_u16() {
        // Smoke the whole range; the match must answer for every input.
        for port in 0..=u16::MAX {
            let _ = service_name(port);
        }
    }
}
