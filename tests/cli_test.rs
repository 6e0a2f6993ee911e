use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const SAMPLE: &str = "I am Sam. Sam I am. I do not like this Sam I am.\r\n\
    That Sam-I-am! That Sam-I-am! I do not like that Sam-I-am!\r\n";

#[test]
fn compression_matches_reference() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("aaaab.txt");
    let out_path = temp_dir.path().join("aaaab.fgk");
    std::fs::write(&in_path,"AAAAB")?;
    Command::cargo_bin("fgkcompressor")?
        .arg("-c").arg(&in_path).arg(&out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed 5 into 5"));
    assert_eq!(std::fs::read(out_path)?,vec![0x20,0xf1,0x08,0x80,0x00]);
    Ok(())
}

#[test]
fn round_trip() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let cmp_path = temp_dir.path().join("sample.fgk");
    let out_path = temp_dir.path().join("expanded.txt");
    std::fs::write(&in_path,SAMPLE)?;
    Command::cargo_bin("fgkcompressor")?
        .arg("-c").arg(&in_path).arg(&cmp_path)
        .assert()
        .success();
    Command::cargo_bin("fgkcompressor")?
        .arg("-d").arg(&cmp_path).arg(&out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("expanded"));
    assert_eq!(std::fs::read(out_path)?,SAMPLE.as_bytes().to_vec());
    Ok(())
}

#[test]
fn empty_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("empty");
    let cmp_path = temp_dir.path().join("empty.fgk");
    let out_path = temp_dir.path().join("empty.out");
    std::fs::write(&in_path,"")?;
    Command::cargo_bin("fgkcompressor")?
        .arg("-c").arg(&in_path).arg(&cmp_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&cmp_path)?,vec![0x80,0x00]);
    Command::cargo_bin("fgkcompressor")?
        .arg("-d").arg(&cmp_path).arg(&out_path)
        .assert()
        .success();
    assert!(std::fs::read(out_path)?.is_empty());
    Ok(())
}

#[test]
fn strict_expansion_of_truncated_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("cut.fgk");
    let out_path = temp_dir.path().join("cut.txt");
    std::fs::write(&in_path,[0x20u8,0xf1,0x08])?;
    Command::cargo_bin("fgkcompressor")?
        .arg("-d").arg(&in_path).arg(&out_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out_path)?,"AAAAB".as_bytes().to_vec());
    let strict_out = temp_dir.path().join("strict.txt");
    Command::cargo_bin("fgkcompressor")?
        .arg("-d").arg("--strict").arg(&in_path).arg(&strict_out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnterminatedStream"));
    Ok(())
}

#[test]
fn bad_arguments_touch_nothing() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.txt");
    let out_path = temp_dir.path().join("out.fgk");
    std::fs::write(&in_path,"abc")?;
    // missing mode
    Command::cargo_bin("fgkcompressor")?
        .arg(&in_path).arg(&out_path)
        .assert()
        .failure();
    // both modes
    Command::cargo_bin("fgkcompressor")?
        .arg("-c").arg("-d").arg(&in_path).arg(&out_path)
        .assert()
        .failure();
    // missing output
    Command::cargo_bin("fgkcompressor")?
        .arg("-c").arg(&in_path)
        .assert()
        .failure();
    assert!(!out_path.exists());
    Ok(())
}
