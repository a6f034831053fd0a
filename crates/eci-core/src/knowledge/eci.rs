//! Built-in ECI support catalog and its keyword table.
//!
//! Rule targets are positions in [`ENTRIES`]; keep both tables aligned when editing.

/// (question, answer) in catalog order.
pub(super) const ENTRIES: &[(&str, &str)] = &[
    // 0
    (
        "What is ECI?",
        "ECI stands for Enriched Customer Information. It is the real-time customer data read layer that aggregates and exposes the latest customer information from multiple upstream systems.",
    ),
    // 1
    (
        "What does ECI do?",
        "ECI aggregates and exposes the latest customer information from multiple upstream systems, providing a single, consistent, and accurate customer profile for downstream systems.",
    ),
    // 2
    (
        "Why is ECI important?",
        "ECI provides a single, consistent, and accurate customer profile for downstream systems, ensuring data integrity across the organization.",
    ),
    // 3
    (
        "What is the core principle of ECI?",
        "Data Integrity is the core principle of ECI. It ensures customer data is correct, complete, and consistent across systems.",
    ),
    // 4
    (
        "How does ECI ensure data integrity?",
        "ECI runs automated reconciliation processes to detect missing, out-of-sync, or incorrect customer events. It performs daily reconciliation jobs to validate with source-of-truth systems like ECIF.",
    ),
    // 5
    (
        "How often does ECI reconcile data?",
        "ECI performs a daily reconciliation job to validate with source-of-truth systems (e.g., ECIF).",
    ),
    // 6
    (
        "What type of data does ECI provide?",
        "ECI provides real-time customer demographics, contact information, accounts, status indicators, identifiers, flags, and event-driven updates.",
    ),
    // 7
    (
        "What systems feed data into ECI?",
        "Examples include ECIF, OCIF, core banking systems, event streams, and customer master data systems.",
    ),
    // 8
    (
        "How does ECI receive real-time data?",
        "Data is received through event streams (Kafka or similar), APIs, and synchronized feeds.",
    ),
    // 9
    (
        "What happens if a source system misses an event?",
        "The daily reconciliation job identifies the missing event and re-aligns customer data.",
    ),
    // 10
    (
        "What is the PartyIdentification API?",
        "It is an ID lookup API for mapping customer identifiers across platforms such as ECIF, OCIF, and other party data domains.",
    ),
    // 11
    (
        "Why is the PartyIdentification API used?",
        "To exchange and match customer IDs between systems such as ECIF, OCIF, and other party data domains, ensuring consistent identity resolution.",
    ),
    // 12
    (
        "What types of lookups does PartyIdentification API support?",
        "It supports Customer Number, Party ID, ECIF ID, OCIF ID, and cross-system identifier mapping.",
    ),
    // 13
    (
        "What does a 400 error indicate?",
        "A 400 Bad Request usually means the input ID is not found, customer data is inactive, or payload/lookup parameters are invalid. Verify that the input ID exists and is active in the source system.",
    ),
    // 14
    (
        "What does a 500 error indicate?",
        "A 500 Internal Server Error generally means the issue is not on the API side. The problem might be in APIC (API Connect) routing or configuration. Check APIC logs, routing paths, gateway configuration, or network connectivity.",
    ),
    // 15
    (
        "What is data integrity in ECI?",
        "Data integrity in ECI means ensuring customer data is correct, complete, and consistent across systems through mechanisms like daily reconciliation, duplicate detection, event timestamp validation, sequence ordering, and ID mapping consistency checks.",
    ),
    // 16
    (
        "Does ECI handle real-time changes?",
        "Yes, ECI processes events in near real-time.",
    ),
    // 17
    (
        "What if an upstream system sends delayed events?",
        "The reconciliation job corrects and aligns data when delayed events are received.",
    ),
    // 18
    (
        "How does ECI maintain high reliability?",
        "Through monitoring, event sequencing, reconciliation, and upstream/downstream validation.",
    ),
    // 19
    (
        "What is identity resolution?",
        "Identity resolution is the process of mapping and merging customer identifiers across systems to ensure every system refers to the same customer, avoiding duplicates or mismatched profiles.",
    ),
    // 20
    (
        "How does ECI support identity resolution?",
        "ECI uses the PartyIdentification API for ID lookups to map and merge customer identifiers across systems.",
    ),
    // 21
    (
        "Data not found in API response. What should I do?",
        "Check in upstream systems (e.g., ECIF) whether the customer ID is active and valid.",
    ),
    // 22
    (
        "The API returns inconsistent data. What next?",
        "Run the reconciliation process or verify event timestamps.",
    ),
    // 23
    (
        "When should I escalate an issue?",
        "If reconciliation and APIC checks show no issues, escalate to the ECI support team.",
    ),
    // 24
    (
        "How should I query ECI?",
        "Always use correct identifiers and validate that they are active.",
    ),
    // 25
    (
        "Can ECI be used for bulk queries?",
        "Yes, but bulk usage should be optimized using batch APIs or event-driven sync.",
    ),
    // 26
    (
        "Is ECI a master system?",
        "No. ECI is a read and validation layer, not a master or transactional system.",
    ),
];

/// (triggers, target entry). Declaration order is the tie-break: first rule wins.
pub(super) const RULES: &[(&[&str], usize)] = &[
    (&["what is eci"], 0),
    (&["what does eci do"], 1),
    (&["why is eci important"], 2),
    (&["core principle", "data integrity"], 3),
    (&["how does eci ensure"], 4),
    (&["reconcile", "how often"], 5),
    (&["what type of data"], 6),
    (&["what systems feed", "upstream systems"], 7),
    (&["real-time data", "receive data"], 8),
    (&["miss event", "missing event"], 9),
    (&["partyidentification api", "party identification", "id lookup"], 10),
    (&["why is partyidentification"], 11),
    (&["lookups", "types of lookup"], 12),
    (&["400 error", "bad request"], 13),
    (&["500 error", "internal server"], 14),
    (&["what is data integrity"], 15),
    (&["real-time changes"], 16),
    (&["delayed events"], 17),
    (&["high reliability"], 18),
    (&["what is identity resolution", "identity resolution"], 19),
    (&["support identity"], 20),
    (&["data not found"], 21),
    (&["inconsistent data"], 22),
    (&["escalate"], 23),
    (&["how should i query"], 24),
    (&["bulk queries"], 25),
    (&["master system"], 26),
];
