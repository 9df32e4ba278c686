use std::{io::Read, ptr};

use brkalloc::{Allocator, Sbrk};
use libc::sbrk;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations move the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn print_alloc(
  size: usize,
  addr: *mut u8,
) {
  println!(
    "Allocated {} bytes, address = {:?}, program break = {:?}",
    size,
    addr,
    unsafe { sbrk(0) }
  );
}

fn main() {
  let allocator = Allocator::new(Sbrk);

  print_program_break("start");
  block_until_enter_pressed();

  // 1) A u32. The block holds exactly the 4 bytes asked for.
  let first = allocator.allocate(4);
  println!("\n[1] Allocate 4 bytes");
  print_alloc(4, first);

  let first_ptr = first as *mut u32;
  unsafe { first_ptr.write(0xDEADBEEF) };
  println!("[1] Value written = 0x{:X}", unsafe { first_ptr.read() });

  block_until_enter_pressed();

  // 2) 100 bytes, filled with a pattern.
  let second = allocator.allocate(100);
  println!("\n[2] Allocate 100 bytes");
  print_alloc(100, second);

  unsafe { ptr::write_bytes(second, 0xAB, 100) };
  println!("[2] Initialized with 0xAB");

  block_until_enter_pressed();

  // 3) Free the first block. It is not at the end of the heap, so it is only
  //    marked free and the break stays where it is.
  unsafe { allocator.free(first) };
  println!("\n[3] Freed first block at {:?}", first);
  print_program_break("after interior free");

  block_until_enter_pressed();

  // 4) A small request reuses the freed block.
  let third = allocator.allocate(2);
  println!("\n[4] Allocate 2 bytes (check reuse of freed block)");
  print_alloc(2, third);
  println!(
    "[4] third == first? {}",
    if third == first {
      "Yes, it reused the freed block"
    } else {
      "No, it allocated somewhere else"
    }
  );

  block_until_enter_pressed();

  // 5) Grow the heap by 64 KiB, then free it again: the trailing block goes
  //    straight back and the break drops.
  print_program_break("before large alloc");
  let big = allocator.allocate(64 * 1024);
  print_alloc(64 * 1024, big);
  print_program_break("after large alloc");

  unsafe { allocator.free(big) };
  print_program_break("after trailing free");

  block_until_enter_pressed();

  // 6) Zeroed array and resize.
  let zeroed = allocator.zero_allocate(8, 4);
  println!("\n[6] zero_allocate(8, 4) = {:?}", zeroed);

  let grown = unsafe { allocator.resize(zeroed, 256) };
  println!("[6] resize to 256 bytes = {:?}", grown);

  match allocator.check() {
    Ok(stats) => println!("\n[7] Block list: {:?}", stats),
    Err(err) => println!("\n[7] Block list is broken: {}", err),
  }
}
