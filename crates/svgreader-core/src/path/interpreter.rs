//! Stateful reader over path-data tokens.
//!
//! Implements the SVG path grammar (<https://www.w3.org/TR/SVG11/paths.html#PathData>): every
//! command repeats implicitly for each following group of numbers, `M/m` repeats as `L/l`, and the
//! shorthand curves `S/s` and `T/t` reflect the previous control point only when the previous
//! segment belongs to the same curve family.

use super::token::{PathToken, tokenize};
use super::{PathError, Subpath};
use crate::geom::{Point, point};
use crate::tessellate::{self, ArcSegment};
use std::mem;

/// Interprets path data `d`, appending local-space subpaths to `out`.
///
/// On error, the subpaths completed before the offending command (including the one being built)
/// stay in `out`.
pub fn add_path_data(d: &str, tolerance2: f64, out: &mut Vec<Subpath>) -> Result<(), PathError> {
    let tokens = tokenize(d).map_err(|e| PathError::Lex {
        offset: e.offset,
        text: e.text,
    })?;
    add_path(&tokens, tolerance2, out)
}

/// Interprets an already tokenized path.
pub fn add_path(tokens: &[PathToken], tolerance2: f64, out: &mut Vec<Subpath>) -> Result<(), PathError> {
    Interpreter::new(tokens, tolerance2, out).run()
}

struct Interpreter<'a> {
    tokens: &'a [PathToken],
    pos: usize,
    tolerance2: f64,
    pen: Point,
    start: Point,
    prev_command: Option<char>,
    prev_control: Point,
    subpath: Subpath,
    out: &'a mut Vec<Subpath>,
}

impl<'a> Interpreter<'a> {
    fn new(tokens: &'a [PathToken], tolerance2: f64, out: &'a mut Vec<Subpath>) -> Self {
        Self {
            tokens,
            pos: 0,
            tolerance2,
            pen: point(0.0, 0.0),
            start: point(0.0, 0.0),
            prev_command: None,
            prev_control: point(0.0, 0.0),
            subpath: Vec::new(),
            out,
        }
    }

    fn run(mut self) -> Result<(), PathError> {
        let result = self.commands();
        self.flush();
        result
    }

    fn commands(&mut self) -> Result<(), PathError> {
        while let Some(token) = self.tokens.get(self.pos).copied() {
            self.pos += 1;
            let cmd = match token {
                PathToken::Command(c) => c,
                PathToken::Number(value) => return Err(PathError::MissingCommand { value }),
            };
            let relative = cmd.is_ascii_lowercase();
            match cmd {
                'M' | 'm' => {
                    self.flush();
                    let [x, y] = self.args::<2>(cmd)?;
                    let p = self.resolve(relative, x, y);
                    self.pen = p;
                    self.start = p;
                    self.subpath.push(p);
                    self.prev_command = Some(cmd);
                    let implicit = if relative { 'l' } else { 'L' };
                    while self.next_is_number() {
                        let [x, y] = self.args::<2>(implicit)?;
                        let p = self.resolve(relative, x, y);
                        self.line_to(p);
                        self.prev_command = Some(implicit);
                    }
                }
                'Z' | 'z' => {
                    if let Some(&first) = self.subpath.first() {
                        self.subpath.push(first);
                        self.flush();
                    }
                    self.pen = self.start;
                    self.prev_command = Some(cmd);
                }
                'L' | 'l' => self.repeat::<2>(cmd, |s, [x, y]| {
                    let p = s.resolve(relative, x, y);
                    s.line_to(p);
                })?,
                'H' | 'h' => self.repeat::<1>(cmd, |s, [x]| {
                    let x = if relative { s.pen.x + x } else { x };
                    s.line_to(point(x, s.pen.y));
                })?,
                'V' | 'v' => self.repeat::<1>(cmd, |s, [y]| {
                    let y = if relative { s.pen.y + y } else { y };
                    s.line_to(point(s.pen.x, y));
                })?,
                'C' | 'c' => self.repeat::<6>(cmd, |s, [x2, y2, x3, y3, x4, y4]| {
                    let p2 = s.resolve(relative, x2, y2);
                    let p3 = s.resolve(relative, x3, y3);
                    let p4 = s.resolve(relative, x4, y4);
                    s.cubic_to(p2, p3, p4);
                })?,
                'S' | 's' => self.repeat::<4>(cmd, |s, [x3, y3, x4, y4]| {
                    let p2 = s.reflected_control(&['C', 'c', 'S', 's']);
                    let p3 = s.resolve(relative, x3, y3);
                    let p4 = s.resolve(relative, x4, y4);
                    s.cubic_to(p2, p3, p4);
                })?,
                'Q' | 'q' => self.repeat::<4>(cmd, |s, [x2, y2, x3, y3]| {
                    let p2 = s.resolve(relative, x2, y2);
                    let p3 = s.resolve(relative, x3, y3);
                    s.quadratic_to(p2, p3);
                })?,
                'T' | 't' => self.repeat::<2>(cmd, |s, [x3, y3]| {
                    let p2 = s.reflected_control(&['Q', 'q', 'T', 't']);
                    let p3 = s.resolve(relative, x3, y3);
                    s.quadratic_to(p2, p3);
                })?,
                'A' | 'a' => self.repeat::<7>(cmd, |s, [rx, ry, rot, large, sweep, x, y]| {
                    let to = s.resolve(relative, x, y);
                    s.arc_to(ArcSegment {
                        from: s.pen,
                        rx,
                        ry,
                        x_axis_rotation: rot,
                        large_arc: large != 0.0,
                        sweep: sweep != 0.0,
                        to,
                    });
                })?,
                other => return Err(PathError::UnknownCommand { command: other }),
            }
        }
        Ok(())
    }

    /// Runs `segment` for the mandatory first parameter group and every implicit repeat.
    fn repeat<const N: usize>(
        &mut self,
        cmd: char,
        mut segment: impl FnMut(&mut Self, [f64; N]),
    ) -> Result<(), PathError> {
        loop {
            let args = self.args::<N>(cmd)?;
            segment(self, args);
            self.prev_command = Some(cmd);
            if !self.next_is_number() {
                return Ok(());
            }
        }
    }

    fn args<const N: usize>(&mut self, cmd: char) -> Result<[f64; N], PathError> {
        let mut args = [0.0; N];
        for (found, slot) in args.iter_mut().enumerate() {
            match self.tokens.get(self.pos).and_then(PathToken::number) {
                Some(v) => {
                    *slot = v;
                    self.pos += 1;
                }
                None => {
                    return Err(PathError::MissingParameters {
                        command: cmd,
                        expected: N,
                        found,
                    });
                }
            }
        }
        Ok(args)
    }

    fn next_is_number(&self) -> bool {
        matches!(self.tokens.get(self.pos), Some(PathToken::Number(_)))
    }

    fn resolve(&self, relative: bool, x: f64, y: f64) -> Point {
        if relative {
            point(self.pen.x + x, self.pen.y + y)
        } else {
            point(x, y)
        }
    }

    fn reflected_control(&self, family: &[char]) -> Point {
        match self.prev_command {
            Some(prev) if family.contains(&prev) => {
                point(2.0 * self.pen.x - self.prev_control.x, 2.0 * self.pen.y - self.prev_control.y)
            }
            _ => self.pen,
        }
    }

    fn ensure_started(&mut self) {
        if self.subpath.is_empty() {
            self.subpath.push(self.pen);
        }
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_started();
        self.subpath.push(p);
        self.pen = p;
    }

    fn cubic_to(&mut self, p2: Point, p3: Point, p4: Point) {
        self.ensure_started();
        tessellate::cubic_bezier(&mut self.subpath, self.pen, p2, p3, p4, self.tolerance2);
        self.subpath.push(p4);
        self.prev_control = p3;
        self.pen = p4;
    }

    fn quadratic_to(&mut self, p2: Point, p3: Point) {
        self.ensure_started();
        tessellate::quadratic_bezier(&mut self.subpath, self.pen, p2, p3, self.tolerance2);
        self.subpath.push(p3);
        self.prev_control = p2;
        self.pen = p3;
    }

    fn arc_to(&mut self, arc: ArcSegment) {
        let mut interior = Vec::new();
        if tessellate::arc(&mut interior, &arc, self.tolerance2) {
            self.ensure_started();
            self.subpath.extend(interior);
            self.subpath.push(arc.to);
        }
        self.pen = arc.to;
    }

    fn flush(&mut self) {
        if !self.subpath.is_empty() {
            self.out.push(mem::take(&mut self.subpath));
        }
    }
}
