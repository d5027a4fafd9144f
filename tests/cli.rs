use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cmd(store: &Path) -> assert_cmd::Command {
    let mut c = cargo_bin_cmd!("graduation-score");
    c.env_remove("GRADUATION_STORE")
        .env_remove("RUST_LOG")
        .arg("--store")
        .arg(store);
    c
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("exams.json")
}

fn add(store: &Path, args: &[&str]) -> String {
    let output = cmd(store).arg("add").args(args).assert().success();
    String::from_utf8(output.get_output().stdout.clone()).unwrap()
}

mod records {
    use super::*;

    #[test]
    fn test_add_and_list() {
        let dir = TempDir::new().unwrap();
        let store = store_path(&dir);

        add(&store, &["--name", "Reti di Calcolatori", "--grade", "30", "--credits", "9", "--honors"]);
        add(&store, &["--name", "Inglese B2", "--credits", "3", "--recognition"]);

        cmd(&store)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("2 exams:"))
            .stdout(predicate::str::contains("[30L] Reti di Calcolatori (9 credits)"))
            .stdout(predicate::str::contains("[C] Inglese B2 (3 credits, recognized)"));
    }

    #[test]
    fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();

        cmd(&store_path(&dir))
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No exams recorded yet."));
    }

    #[test]
    fn test_add_rejects_honors_without_thirty() {
        let dir = TempDir::new().unwrap();
        let store = store_path(&dir);

        cmd(&store)
            .args(["add", "--name", "Fisica", "--grade", "28", "--credits", "6", "--honors"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("honors are only awarded with a grade of 30"));
        assert!(!store.exists());
    }

    #[test]
    fn test_add_rejects_out_of_range_credits() {
        let dir = TempDir::new().unwrap();

        cmd(&store_path(&dir))
            .args(["add", "--name", "Tesi", "--grade", "27", "--credits", "51"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("credits 51 are outside 1..=50"));
    }

    #[test]
    fn test_add_requires_grade_or_recognition() {
        let dir = TempDir::new().unwrap();

        cmd(&store_path(&dir))
            .args(["add", "--name", "Fisica", "--credits", "6"])
            .assert()
            .failure();
        cmd(&store_path(&dir))
            .args(["add", "--name", "Fisica", "--credits", "6", "--grade", "27", "--recognition"])
            .assert()
            .failure();
    }

    #[test]
    fn test_add_reports_nothing_when_save_fails() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("missing").join("exams.json");

        cmd(&store)
            .args(["add", "--name", "Analisi", "--grade", "25", "--credits", "9"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Added").not())
            .stderr(predicate::str::contains("could not save exam store"));
    }

    #[test]
    fn test_remove_by_id() {
        let dir = TempDir::new().unwrap();
        let store = store_path(&dir);

        let stdout = add(&store, &["--name", "Analisi", "--grade", "25", "--credits", "9"]);
        let id = stdout
            .trim()
            .trim_end_matches('.')
            .rsplit(' ')
            .next()
            .unwrap()
            .to_string();

        cmd(&store)
            .args(["remove", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Removed exam {id}.")));
        cmd(&store)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No exams recorded yet."));
    }

    #[test]
    fn test_remove_unknown_id_fails() {
        let dir = TempDir::new().unwrap();

        cmd(&store_path(&dir))
            .args(["remove", "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no exam with id"));
    }

    #[test]
    fn test_corrupt_store_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = store_path(&dir);
        fs::write(&store, "{ broken").unwrap();

        cmd(&store)
            .arg("stats")
            .assert()
            .success()
            .stdout(predicate::str::contains("Weighted average (LM-32): 0.00"))
            .stderr(predicate::str::contains("could not read exam store"));

        cmd(&store)
            .args(["add", "--name", "Analisi", "--grade", "25", "--credits", "9"])
            .assert()
            .failure();
        assert_eq!(fs::read_to_string(&store).unwrap(), "{ broken");
    }
}

mod scoring {
    use super::*;

    fn seeded_store(dir: &TempDir) -> PathBuf {
        let store = store_path(dir);
        add(&store, &["--name", "Fondamenti", "--grade", "18", "--credits", "3"]);
        add(&store, &["--name", "Algoritmi", "--grade", "24", "--credits", "9"]);
        add(&store, &["--name", "Tirocinio", "--credits", "6", "--recognition"]);
        store
    }

    #[test]
    fn test_stats_apply_discount() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        cmd(&store)
            .arg("stats")
            .assert()
            .success()
            .stdout(predicate::str::contains("Weighted average (LM-32): 24.00"))
            .stdout(predicate::str::contains("Weighted average (standard): 22.50"))
            .stdout(predicate::str::contains("Arithmetic average: 21.00"))
            .stdout(predicate::str::contains("Graduation base: 88.00"))
            .stdout(predicate::str::contains("Credits: 18/120 (15%)"))
            .stdout(predicate::str::contains("Honors eligible: no"));
    }

    #[test]
    fn test_score_with_bonuses() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        // 88 + 7.5 + 1 + 2 = 98.5
        cmd(&store)
            .args(["score", "--thesis-points", "7.5", "--erasmus", "--in-course"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Projected graduation score: 99/110"));
    }

    #[test]
    fn test_score_rejects_bad_thesis_points() {
        let dir = TempDir::new().unwrap();

        cmd(&store_path(&dir))
            .args(["score", "--thesis-points", "11.5"])
            .assert()
            .failure();
        cmd(&store_path(&dir))
            .args(["score", "--thesis-points", "3.2"])
            .assert()
            .failure();
    }

    #[test]
    fn test_score_cum_laude() {
        let dir = TempDir::new().unwrap();
        let store = store_path(&dir);
        for name in ["Reti", "Sistemi", "Compilatori", "Sicurezza"] {
            add(&store, &["--name", name, "--grade", "30", "--credits", "9", "--honors"]);
        }

        cmd(&store)
            .args(["score", "--thesis-points", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Projected graduation score: 114/110"))
            .stdout(predicate::str::contains("Cum laude can be awarded."));
    }

    #[test]
    fn test_simulate_without_input() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        cmd(&store)
            .args(["simulate", "--grade", "trenta", "--credits", "6"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Enter a valid grade and credits"));
    }

    #[test]
    fn test_simulate_next_exam() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);

        // (24 * 9 + 30 * 9) / 18
        cmd(&store)
            .args(["simulate", "--grade", "30", "--credits", "9"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Weighted average (LM-32): 27.00"));
        cmd(&store)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("3 exams:"));
    }

    #[test]
    fn test_report_written() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir);
        let out = dir.path().join("report.md");

        cmd(&store)
            .args(["report", "--thesis-points", "4", "--out"])
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("Report written to"));

        let report = fs::read_to_string(&out).unwrap();
        assert!(report.contains("# Graduation Score Report"));
        assert!(report.contains("- [18] Fondamenti (3 credits) discounted"));
        assert!(report.contains("- Projected score: 92/110"));
    }

    #[test]
    fn test_import_csv() {
        let dir = TempDir::new().unwrap();
        let store = store_path(&dir);
        let csv = dir.path().join("exams.csv");
        fs::write(
            &csv,
            "name,grade,credits,honors,recognition\n\
             Basi di Dati,30,9,true,false\n\
             Inglese,,3,,true\n\
             Fisica,35,6,,\n",
        )
        .unwrap();

        cmd(&store)
            .arg("import")
            .arg("--csv")
            .arg(&csv)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 2 exams"))
            .stdout(predicate::str::contains("(1 skipped)"));

        cmd(&store)
            .arg("stats")
            .assert()
            .success()
            .stdout(predicate::str::contains("Honors bonus: 0.5 (1 honors)"))
            .stdout(predicate::str::contains("Credits: 12/120"));
    }
}
