#![allow(clippy::uninlined_format_args)]

use bounce_parser::Config;

const SAMPLE_LOG: &str = "\
Jun  1 10:00:00 mail postfix/qmgr[2113]: 4F1A2B3C4D: from=<newsletter@shop.example>, size=4821, nrcpt=2 (queue active)
Jun  1 10:00:02 mail postfix/smtp[2117]: 4F1A2B3C4D: to=<alice@gmail.com>, relay=gmail-smtp-in.l.google.com[142.250.4.27]:25, delay=2.1, delays=0.05/0.01/1.2/0.84, dsn=5.1.1, status=bounced (host gmail-smtp-in.l.google.com[142.250.4.27] said: 550-5.1.1 The email account that you tried to reach does not exist (in reply to RCPT TO command))
Jun  1 10:00:03 mail postfix/smtp[2118]: 4F1A2B3C4D: to=<bob@icloud.com>, relay=mx01.mail.icloud.com[17.57.154.33]:25, delay=3.4, delays=0.05/0.02/1.9/1.4, dsn=4.2.2, status=deferred (host mx01.mail.icloud.com[17.57.154.33] said: 452 4.2.2 <bob@icloud.com>: user is over quota (in reply to RCPT TO command))
Jun  1 10:00:03 mail postfix/bounce[2120]: 4F1A2B3C4D: sender non-delivery notification: 5E6F7A8B9C
Jun  1 10:05:11 mail postfix/qmgr[2113]: 7D8E9F0A1B: from=<billing@shop.example>, size=2210, nrcpt=1 (queue active)
Jun  1 10:05:12 mail postfix/smtp[2131]: 7D8E9F0A1B: to=<carol@nowhere.invalid>, relay=none, delay=0.3, delays=0.02/0/0.28/0, dsn=5.4.4, status=bounced (Host or domain name not found. Name service error for name=nowhere.invalid type=A: Host not found)
Jun  1 10:07:40 mail postfix/smtp[2140]: 0C0C0C0C0C: to=<dave@yahoo.com>, relay=mta7.am0.yahoodns.net[67.195.204.79]:25, delay=1.0, delays=0.1/0/0.4/0.5, dsn=5.0.0, status=bounced (host said: 554 delivery error)
";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing bounce correlation on sample log...");

    let config = Config {
        year: Some(2025),
        ..Config::default()
    };
    let correlator = config.correlator()?;
    let lines: Vec<&str> = SAMPLE_LOG.lines().collect();
    let report = correlator.correlate(&lines);

    println!("\n=== Records ({}) ===", report.records.len());
    for record in &report.records {
        println!(
            "{} {} {} -> {} dsn={} status={} hard={}",
            record.date.to_rfc3339(),
            record.queue_id,
            record.from,
            record.to,
            record.dsn,
            record.status,
            config.soft_dsn.is_hard(&record.dsn)
        );
        println!("    reason: {}", record.reason);
    }

    println!("\n=== Stats ===");
    println!("{}", serde_json::to_string_pretty(&report.stats)?);

    // 0C0C0C0C0C was never admitted by qmgr in this log
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.stats.ineligible_failures, 1);

    Ok(())
}
