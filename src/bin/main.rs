// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use recharge_engine_rs::{Engine, RequestId, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::debug;

/// Recharge Engine - Process recharge operation CSV files
///
/// Reads operations from a CSV file and outputs wallet states to stdout.
/// Supports user registration, recharge submission, approval, and rejection.
#[derive(Parser, Debug)]
#[command(name = "recharge-engine-rs")]
#[command(about = "A recharge engine that processes operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,user,request,amount,utr,name,email
    /// Example: cargo run -- operations.csv > wallets.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Process operations from CSV
    let engine = match process_operations(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_wallets(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, user, request, amount, utr, name, email` — the trailing
/// fields only apply to some operations and may be left empty.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    user: u32,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    request: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    amount: Option<Decimal>,
    #[serde(default)]
    utr: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// A single parsed operation against the engine.
#[derive(Debug)]
enum Operation {
    Register {
        user: UserId,
        name: String,
        email: String,
    },
    Submit {
        user: UserId,
        amount: Decimal,
        utr: String,
    },
    Approve {
        user: UserId,
        request: RequestId,
    },
    Reject {
        user: UserId,
        request: RequestId,
    },
}

impl CsvRecord {
    /// Converts the CSV record to an operation.
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let user = UserId(self.user);

        match self.op.to_lowercase().as_str() {
            "register" => Some(Operation::Register {
                user,
                name: self.name.unwrap_or_default(),
                email: self.email.unwrap_or_default(),
            }),
            "submit" => Some(Operation::Submit {
                user,
                amount: self.amount?,
                utr: self.utr?,
            }),
            "approve" => Some(Operation::Approve {
                user,
                request: RequestId(self.request?),
            }),
            "reject" => Some(Operation::Reject {
                user,
                request: RequestId(self.request?),
            }),
            _ => None,
        }
    }
}

/// Process operations from a CSV reader.
///
/// Uses streaming parsing to handle arbitrarily large CSV files without
/// loading the entire file into memory. Malformed rows and failed
/// operations are logged and skipped; processing never stops early.
///
/// # CSV Format
///
/// Expected columns: `op, user, request, amount, utr, name, email`
/// - `op`: Operation (register, submit, approve, reject)
/// - `user`: User ID (u32)
/// - `request`: Request ID (u64, approve/reject only)
/// - `amount`: Decimal amount (submit only)
/// - `utr`: Bank transaction reference (submit only)
/// - `name`/`email`: Display fields (register only)
///
/// # Example
///
/// ```csv
/// op,user,request,amount,utr,name,email
/// register,1,,,,Asha,asha@example.com
/// submit,1,,1000,UTR123,,
/// approve,1,1,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_operations<R: Read>(reader: R) -> Result<Engine, csv::Error> {
    let engine = Engine::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " submit "
        .flexible(true) // Allow missing trailing fields
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_operation() else {
                    debug!("skipping invalid operation record");
                    continue;
                };

                let outcome = match op {
                    Operation::Register { user, name, email } => {
                        engine.register_user(user, &name, &email)
                    }
                    Operation::Submit { user, amount, utr } => {
                        engine.submit_request(user, amount, &utr).map(|_| ())
                    }
                    Operation::Approve { user, request } => {
                        engine.approve(user, request).map(|_| ())
                    }
                    Operation::Reject { user, request } => engine.reject(user, request),
                };

                if let Err(e) = outcome {
                    debug!(reason = %e, "skipping failed operation");
                }
            }
            Err(e) => {
                // Skip malformed rows
                debug!(reason = %e, "skipping malformed row");
                continue;
            }
        }
    }

    Ok(engine)
}

/// Write wallet states to a CSV writer.
///
/// # CSV Format
///
/// Columns: `user, name, balance, first_bonus_granted, requests`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_wallets<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for wallet in engine.wallets() {
        wtr.serialize(wallet.value())?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    #[test]
    fn parse_register_and_submit() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   register,1,,,,Asha,asha@example.com\n\
                   submit,1,,1000,UTR123,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let wallet = engine.get_wallet(&UserId(1)).unwrap();
        assert_eq!(wallet.name(), "Asha");
        assert_eq!(wallet.balance(), Decimal::ZERO);
        assert_eq!(wallet.history().len(), 1);
    }

    #[test]
    fn parse_full_approval_flow() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   register,1,,,,Asha,asha@example.com\n\
                   submit,1,,1000,UTR123,,\n\
                   approve,1,1,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let wallet = engine.get_wallet(&UserId(1)).unwrap();
        assert_eq!(wallet.balance(), dec!(1100)); // 1000 + first-deposit 100
        assert!(wallet.first_bonus_granted());
    }

    #[test]
    fn parse_rejection_flow() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   register,1,,,,Asha,asha@example.com\n\
                   submit,1,,1000,UTR123,,\n\
                   reject,1,1,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let wallet = engine.get_wallet(&UserId(1)).unwrap();
        assert_eq!(wallet.balance(), Decimal::ZERO);
        assert!(engine.list_pending().is_empty());
    }

    #[test]
    fn submit_for_unregistered_user_is_skipped() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   submit,9,,1000,UTR123,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        assert!(engine.get_wallet(&UserId(9)).is_none());
        assert!(engine.list_pending().is_empty());
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   register,1,,,,Asha,asha@example.com\n\
                   submit , 1 , , 1000 , UTR123 ,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        let wallet = engine.get_wallet(&UserId(1)).unwrap();
        assert_eq!(wallet.history().len(), 1);
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   register,1,,,,Asha,asha@example.com\n\
                   not,a,valid,row,at,all,here\n\
                   register,2,,,,Ben,ben@example.com\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        assert!(engine.get_wallet(&UserId(1)).is_some());
        assert!(engine.get_wallet(&UserId(2)).is_some());
    }

    #[test]
    fn write_wallets_to_csv() {
        let csv_input = "op,user,request,amount,utr,name,email\n\
                         register,1,,,,Asha,asha@example.com\n\
                         submit,1,,500,UTR1,,\n\
                         approve,1,1,,,,\n";
        let reader = Cursor::new(csv_input);
        let engine = process_operations(reader).unwrap();

        let mut output = Vec::new();
        write_wallets(&engine, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("user,name,balance,first_bonus_granted,requests"));
        assert!(output_str.contains("550"));
    }

    #[test]
    fn multiple_users() {
        let csv = "op,user,request,amount,utr,name,email\n\
                   register,3,,,,Cara,cara@example.com\n\
                   register,1,,,,Asha,asha@example.com\n\
                   register,2,,,,Ben,ben@example.com\n\
                   submit,1,,2000,UTRA,,\n\
                   submit,2,,100,UTRB,,\n\
                   approve,1,1,,,,\n";
        let reader = Cursor::new(csv);

        let engine = process_operations(reader).unwrap();

        assert_eq!(engine.wallets().count(), 3);
        assert_eq!(
            engine.get_wallet(&UserId(1)).unwrap().balance(),
            dec!(2150) // 2000 + tier 150
        );
        assert_eq!(engine.get_wallet(&UserId(2)).unwrap().balance(), Decimal::ZERO);
        assert_eq!(engine.list_pending().len(), 1);
    }
}
