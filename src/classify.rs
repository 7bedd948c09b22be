//! Phone-number prefix classification into carrier and country.

pub const UNKNOWN: &str = "Unknown";

struct CountryRule {
    calling_code: &'static str,
    country: &'static str,
    carriers: &'static [CarrierRule],
}

struct CarrierRule {
    prefixes: &'static [&'static str],
    carrier: &'static str,
}

/// Ordered longest-code-first; every supported calling code happens to be
/// three digits, so the order is the source order.
const COUNTRY_RULES: &[CountryRule] = &[
    CountryRule {
        calling_code: "256",
        country: "Uganda 🇺🇬",
        carriers: &[
            CarrierRule {
                prefixes: &["75", "70", "74", "20"],
                carrier: "Airtel",
            },
            CarrierRule {
                prefixes: &["77", "78", "39"],
                carrier: "MTN",
            },
            CarrierRule {
                prefixes: &["79"],
                carrier: "Africell",
            },
            CarrierRule {
                prefixes: &["71", "41"],
                carrier: "Uganda Telecom",
            },
            CarrierRule {
                prefixes: &["72"],
                carrier: "Vodafone",
            },
        ],
    },
    CountryRule {
        calling_code: "254",
        country: "Kenya 🇰🇪",
        carriers: &[
            CarrierRule {
                prefixes: &["7"],
                carrier: "Safaricom",
            },
            CarrierRule {
                prefixes: &["10", "11"],
                carrier: "Airtel",
            },
            CarrierRule {
                prefixes: &["20"],
                carrier: "Telkom",
            },
        ],
    },
    CountryRule {
        calling_code: "255",
        country: "Tanzania 🇹🇿",
        carriers: &[
            CarrierRule {
                prefixes: &["65", "68"],
                carrier: "Airtel",
            },
            CarrierRule {
                prefixes: &["75", "76"],
                carrier: "Vodacom",
            },
            CarrierRule {
                prefixes: &["71"],
                carrier: "Tigo",
            },
        ],
    },
    CountryRule {
        calling_code: "250",
        country: "Rwanda 🇷🇼",
        carriers: &[
            CarrierRule {
                prefixes: &["78", "79"],
                carrier: "MTN",
            },
            CarrierRule {
                prefixes: &["72"],
                carrier: "Airtel",
            },
        ],
    },
    CountryRule {
        calling_code: "251",
        country: "Ethiopia 🇪🇹",
        carriers: &[CarrierRule {
            prefixes: &["91", "90", "96"],
            carrier: "Ethio Telecom",
        }],
    },
    CountryRule {
        calling_code: "234",
        country: "Nigeria 🇳🇬",
        carriers: &[
            CarrierRule {
                prefixes: &["701", "702", "703", "704", "705", "706", "707", "708", "709"],
                carrier: "MTN or Glo or Airtel or 9mobile (check exact prefix)",
            },
            CarrierRule {
                prefixes: &["802", "803", "804", "805", "806", "807", "808", "809"],
                carrier: "MTN or Glo or Airtel (legacy numbers)",
            },
        ],
    },
    CountryRule {
        calling_code: "233",
        country: "Ghana 🇬🇭",
        carriers: &[
            CarrierRule {
                prefixes: &["24", "54", "55"],
                carrier: "MTN",
            },
            CarrierRule {
                prefixes: &["20", "50"],
                carrier: "Vodafone",
            },
            CarrierRule {
                prefixes: &["26", "56"],
                carrier: "AirtelTigo",
            },
        ],
    },
    CountryRule {
        calling_code: "263",
        country: "Zimbabwe 🇿🇼",
        carriers: &[
            CarrierRule {
                prefixes: &["71"],
                carrier: "Econet",
            },
            CarrierRule {
                prefixes: &["73"],
                carrier: "Telecel",
            },
            CarrierRule {
                prefixes: &["77"],
                carrier: "NetOne",
            },
        ],
    },
    CountryRule {
        calling_code: "223",
        country: "Mali 🇲🇱",
        carriers: &[
            CarrierRule {
                prefixes: &["7"],
                carrier: "Orange Mali",
            },
            CarrierRule {
                prefixes: &["6"],
                carrier: "Malitel",
            },
        ],
    },
];

/// Classifies a phone number into `(carrier, country)`.
///
/// Total over arbitrary input: a missing match is a normal `Unknown`
/// result, never an error. The optional `+` and any leading zeros after
/// the calling code are stripped before the carrier prefixes are tried;
/// the first matching rule wins.
pub fn classify(phone: &str) -> (&'static str, &'static str) {
    let trimmed = phone.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    for rule in COUNTRY_RULES {
        let Some(rest) = digits.strip_prefix(rule.calling_code) else {
            continue;
        };
        let local = rest.trim_start_matches('0');
        for carrier_rule in rule.carriers {
            if carrier_rule
                .prefixes
                .iter()
                .any(|prefix| local.starts_with(prefix))
            {
                return (carrier_rule.carrier, rule.country);
            }
        }
        return (UNKNOWN, rule.country);
    }

    (UNKNOWN, UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uganda_airtel_with_plus() {
        assert_eq!(classify("+256751722034"), ("Airtel", "Uganda 🇺🇬"));
    }

    #[test]
    fn uganda_mtn_without_plus() {
        assert_eq!(classify("256772123456"), ("MTN", "Uganda 🇺🇬"));
    }

    #[test]
    fn leading_zero_after_code_is_stripped() {
        assert_eq!(classify("+2560751722034"), ("Airtel", "Uganda 🇺🇬"));
    }

    #[test]
    fn kenya_safaricom() {
        assert_eq!(classify("+254712345678"), ("Safaricom", "Kenya 🇰🇪"));
    }

    #[test]
    fn tanzania_vodacom() {
        assert_eq!(classify("+255754000000"), ("Vodacom", "Tanzania 🇹🇿"));
    }

    #[test]
    fn rwanda_airtel() {
        assert_eq!(classify("250721234567"), ("Airtel", "Rwanda 🇷🇼"));
    }

    #[test]
    fn ethiopia_ethio_telecom() {
        assert_eq!(classify("+251911234567"), ("Ethio Telecom", "Ethiopia 🇪🇹"));
    }

    #[test]
    fn nigeria_new_range() {
        let (carrier, country) = classify("+2347051234567");
        assert_eq!(country, "Nigeria 🇳🇬");
        assert!(carrier.starts_with("MTN or Glo"));
    }

    #[test]
    fn ghana_airteltigo() {
        assert_eq!(classify("+233261234567"), ("AirtelTigo", "Ghana 🇬🇭"));
    }

    #[test]
    fn zimbabwe_netone() {
        assert_eq!(classify("+263771234567"), ("NetOne", "Zimbabwe 🇿🇼"));
    }

    #[test]
    fn mali_malitel() {
        assert_eq!(classify("+22360123456"), ("Malitel", "Mali 🇲🇱"));
    }

    #[test]
    fn known_country_unknown_carrier() {
        assert_eq!(classify("+256991722034"), (UNKNOWN, "Uganda 🇺🇬"));
    }

    #[test]
    fn unknown_country() {
        assert_eq!(classify("+15551234567"), (UNKNOWN, UNKNOWN));
    }

    #[test]
    fn malformed_input_is_unknown_not_error() {
        assert_eq!(classify(""), (UNKNOWN, UNKNOWN));
        assert_eq!(classify("+"), (UNKNOWN, UNKNOWN));
        assert_eq!(classify("hello"), (UNKNOWN, UNKNOWN));
    }

    #[test]
    fn bare_country_code_is_unknown_carrier() {
        assert_eq!(classify("+256"), (UNKNOWN, "Uganda 🇺🇬"));
    }
}
