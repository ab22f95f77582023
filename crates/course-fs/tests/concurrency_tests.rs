//! Concurrent writers must never leave a torn file behind.

use course_fs::io;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

#[test]
fn concurrent_writes_leave_one_complete_version() {
    let dir = tempdir().unwrap();
    let file_path = Arc::new(dir.path().join("slide-01.html"));

    let num_threads = 8;
    let writes_per_thread = 10;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let path = Arc::clone(&file_path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..writes_per_thread {
                    let content = format!("worker{}:render{}\n", thread_id, i);
                    io::write_text(&path, &content).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let content = std::fs::read_to_string(file_path.as_ref()).unwrap();
    assert_eq!(content.matches("worker").count(), 1, "torn write: {content}");
    assert!(content.ends_with('\n'));

    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn concurrent_writes_to_distinct_files() {
    let dir = tempdir().unwrap();
    let root = Arc::new(dir.path().to_path_buf());

    let handles: Vec<_> = (0..6)
        .map(|n| {
            let root = Arc::clone(&root);
            thread::spawn(move || {
                let path = root.join(format!("page-slide-{n:02}.md"));
                io::write_text(&path, &format!("slide {n}")).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for n in 0..6 {
        let path = dir.path().join(format!("page-slide-{n:02}.md"));
        assert_eq!(io::read_text(&path).unwrap(), format!("slide {n}"));
    }
}
