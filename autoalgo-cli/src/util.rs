use crate::prelude::*;

pub fn load_file<P: AsRef<Path>>(path: P) -> Result<String> {
    info!(
        "loading file {}",
        path.as_ref().to_str().unwrap_or("[non UTF-8 path]")
    );
    std::fs::read_to_string(path).map_err(Error::IOError)
}

/// List the files in `dir` with extension `ext`, sorted by name.
pub fn enumerate_files<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<PathBuf>> {
    let dir_log = dir.as_ref().display();
    info!("enumerating *.{} files from {}", ext, dir_log);

    let mut r = std::fs::read_dir(&dir)
        .map_err(Error::IOError)?
        .filter_map(|x| {
            let x = match x {
                Err(e) => {
                    warn!("error listing {}: {}", dir_log, e);
                    return None;
                }
                Ok(x) => x,
            };
            let p = x.path();
            if x.file_name().to_str().is_none() {
                warn!("skip non-UTF8 file name {} in {}", p.display(), dir_log);
                return None;
            }
            (p.is_file() && p.extension().map_or(false, |e| e == ext)).then(|| p)
        })
        .collect::<Vec<_>>();
    r.sort();
    Ok(r)
}

pub fn ensure_utf8_path<'a, P: AsRef<Path> + 'a>(p: &'a P) -> Result<&'a str> {
    match p.as_ref().to_str() {
        Some(x) => Ok(x),
        None => Err(Error::BadPathEncoding(p.as_ref().to_path_buf())),
    }
}
